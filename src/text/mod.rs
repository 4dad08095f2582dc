//! Text tasks: classification, search, question answering and the
//! tokenization they share.

pub mod bert_tokenizer;
pub mod question_answerer;
pub mod text_classifier;
pub mod text_searcher;

pub use bert_tokenizer::{BertTokenizer, EncodedSequence, TokenizedText};
pub use question_answerer::{BertQuestionAnswerer, BertQuestionAnswererOptions};
pub use text_classifier::{TextClassifier, TextClassifierOptions};
pub use text_searcher::{TextSearcher, TextSearcherOptions};
