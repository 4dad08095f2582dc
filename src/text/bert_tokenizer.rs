//! WordPiece tokenization for BERT-family text models.
//!
//! Wraps the `tokenizers` pipeline (BERT normalizer, BERT pre-tokenizer,
//! WordPiece model) built from a plain vocabulary file with one token per
//! line, and produces the fixed-length id/mask/segment triples the text
//! models consume.

use std::path::Path;

use ndarray::Array2;
use tokenizers::Tokenizer;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;

use crate::core::errors::{TaskError, TaskResult};

const CLS_TOKEN: &str = "[CLS]";
const SEP_TOKEN: &str = "[SEP]";
const PAD_TOKEN: &str = "[PAD]";
const UNK_TOKEN: &str = "[UNK]";

/// Tokens of one text, with ids and byte offsets into the source string.
#[derive(Debug, Clone)]
pub struct TokenizedText {
    /// WordPiece tokens.
    pub tokens: Vec<String>,
    /// Vocabulary ids, one per token.
    pub ids: Vec<i64>,
    /// Byte range of each token in the source string.
    pub offsets: Vec<(usize, usize)>,
}

/// Fixed-length model input built from one or two token sequences.
#[derive(Debug, Clone)]
pub struct EncodedSequence {
    /// Token ids, `[1, max_seq_len]`.
    pub ids: Array2<i64>,
    /// Attention mask, 1 for real tokens, `[1, max_seq_len]`.
    pub mask: Array2<i64>,
    /// Segment ids, 0 for the first sequence and 1 for the second,
    /// `[1, max_seq_len]`.
    pub type_ids: Array2<i64>,
}

/// WordPiece tokenizer with BERT text normalization.
pub struct BertTokenizer {
    tokenizer: Tokenizer,
    cls_id: i64,
    sep_id: i64,
    pad_id: i64,
}

impl std::fmt::Debug for BertTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertTokenizer")
            .field("cls_id", &self.cls_id)
            .field("sep_id", &self.sep_id)
            .field("pad_id", &self.pad_id)
            .finish()
    }
}

impl BertTokenizer {
    /// Builds a tokenizer from a vocabulary file with one token per line.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the file cannot be read
    /// or the vocabulary lacks the `[CLS]`/`[SEP]`/`[PAD]`/`[UNK]` special
    /// tokens.
    pub fn from_vocab_file(path: impl AsRef<Path>) -> TaskResult<Self> {
        let path = path.as_ref();
        let wordpiece = WordPiece::from_file(
            path.to_str().ok_or_else(|| {
                TaskError::invalid_argument(format!(
                    "vocabulary path '{}' is not valid UTF-8",
                    path.display()
                ))
            })?,
        )
        .unk_token(UNK_TOKEN.to_string())
        .build()
        .map_err(|e| {
            TaskError::invalid_argument(format!(
                "failed to load vocabulary '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

        let special_id = |token: &str| -> TaskResult<i64> {
            tokenizer.token_to_id(token).map(i64::from).ok_or_else(|| {
                TaskError::invalid_argument(format!(
                    "vocabulary '{}' is missing the {} token",
                    path.display(),
                    token
                ))
            })
        };
        let cls_id = special_id(CLS_TOKEN)?;
        let sep_id = special_id(SEP_TOKEN)?;
        let pad_id = special_id(PAD_TOKEN)?;

        Ok(Self {
            tokenizer,
            cls_id,
            sep_id,
            pad_id,
        })
    }

    /// Tokenizes a text without adding special tokens.
    pub fn tokenize(&self, text: &str) -> TaskResult<TokenizedText> {
        let encoding = self.tokenizer.encode(text, false).map_err(|e| {
            TaskError::invalid_argument(format!("failed to tokenize input text: {e}"))
        })?;
        Ok(TokenizedText {
            tokens: encoding.get_tokens().to_vec(),
            ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            offsets: encoding.get_offsets().to_vec(),
        })
    }

    /// Looks up the id of a single token.
    pub fn token_id(&self, token: &str) -> Option<i64> {
        self.tokenizer.token_to_id(token).map(i64::from)
    }

    /// Builds `[CLS] text [SEP]` model input padded to `max_seq_len`.
    ///
    /// Tokens beyond the available room are truncated.
    pub fn encode_single(&self, text: &str, max_seq_len: usize) -> TaskResult<EncodedSequence> {
        let tokens = self.tokenize(text)?;
        let room = max_seq_len.saturating_sub(2);
        let mut ids = Vec::with_capacity(max_seq_len);
        ids.push(self.cls_id);
        ids.extend(tokens.ids.iter().take(room));
        ids.push(self.sep_id);
        let type_ids = vec![0i64; ids.len()];
        self.pad(ids, type_ids, max_seq_len)
    }

    /// Builds `[CLS] first [SEP] second [SEP]` model input padded to
    /// `max_seq_len`, as consumed by span-prediction models.
    pub fn encode_pair(
        &self,
        first: &[i64],
        second: &[i64],
        max_seq_len: usize,
    ) -> TaskResult<EncodedSequence> {
        let mut ids = Vec::with_capacity(max_seq_len);
        let mut type_ids = Vec::with_capacity(max_seq_len);
        ids.push(self.cls_id);
        type_ids.push(0);
        ids.extend_from_slice(first);
        type_ids.extend(std::iter::repeat_n(0, first.len()));
        ids.push(self.sep_id);
        type_ids.push(0);
        ids.extend_from_slice(second);
        type_ids.extend(std::iter::repeat_n(1, second.len()));
        ids.push(self.sep_id);
        type_ids.push(1);
        if ids.len() > max_seq_len {
            return Err(TaskError::invalid_argument(format!(
                "sequence of {} token(s) exceeds the model's maximum of {}",
                ids.len(),
                max_seq_len
            )));
        }
        self.pad(ids, type_ids, max_seq_len)
    }

    fn pad(
        &self,
        mut ids: Vec<i64>,
        mut type_ids: Vec<i64>,
        max_seq_len: usize,
    ) -> TaskResult<EncodedSequence> {
        let used = ids.len();
        let mut mask = vec![1i64; used];
        ids.resize(max_seq_len, self.pad_id);
        mask.resize(max_seq_len, 0);
        type_ids.resize(max_seq_len, 0);

        Ok(EncodedSequence {
            ids: Array2::from_shape_vec((1, max_seq_len), ids)?,
            mask: Array2::from_shape_vec((1, max_seq_len), mask)?,
            type_ids: Array2::from_shape_vec((1, max_seq_len), type_ids)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Writes a small WordPiece vocabulary usable across the text tests.
    pub(crate) fn test_vocab() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for token in [
            "[PAD]", "[UNK]", "[CLS]", "[SEP]", "hello", "world", "rust", "is", "fast", "what",
            "##s",
        ] {
            writeln!(file, "{token}").unwrap();
        }
        file
    }

    #[test]
    fn test_tokenize_lowercases_and_maps_ids() {
        let vocab = test_vocab();
        let tokenizer = BertTokenizer::from_vocab_file(vocab.path()).unwrap();

        let tokens = tokenizer.tokenize("Hello world").unwrap();
        assert_eq!(tokens.tokens, vec!["hello", "world"]);
        assert_eq!(tokens.ids, vec![4, 5]);
        assert_eq!(tokens.offsets[0], (0, 5));
        assert_eq!(tokens.offsets[1], (6, 11));
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let vocab = test_vocab();
        let tokenizer = BertTokenizer::from_vocab_file(vocab.path()).unwrap();
        let tokens = tokenizer.tokenize("zebra").unwrap();
        assert_eq!(tokens.tokens, vec!["[UNK]"]);
        assert_eq!(tokens.ids, vec![1]);
    }

    #[test]
    fn test_encode_single_layout() {
        let vocab = test_vocab();
        let tokenizer = BertTokenizer::from_vocab_file(vocab.path()).unwrap();

        let encoded = tokenizer.encode_single("hello world", 8).unwrap();
        assert_eq!(encoded.ids.shape(), &[1, 8]);
        let ids: Vec<i64> = encoded.ids.iter().copied().collect();
        // [CLS] hello world [SEP] then [PAD] padding.
        assert_eq!(ids, vec![2, 4, 5, 3, 0, 0, 0, 0]);
        let mask: Vec<i64> = encoded.mask.iter().copied().collect();
        assert_eq!(mask, vec![1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_single_truncates() {
        let vocab = test_vocab();
        let tokenizer = BertTokenizer::from_vocab_file(vocab.path()).unwrap();

        let encoded = tokenizer.encode_single("hello world rust is fast", 4).unwrap();
        let ids: Vec<i64> = encoded.ids.iter().copied().collect();
        assert_eq!(ids, vec![2, 4, 5, 3]);
    }

    #[test]
    fn test_encode_pair_segments() {
        let vocab = test_vocab();
        let tokenizer = BertTokenizer::from_vocab_file(vocab.path()).unwrap();

        let encoded = tokenizer.encode_pair(&[9], &[4, 5], 8).unwrap();
        let ids: Vec<i64> = encoded.ids.iter().copied().collect();
        assert_eq!(ids, vec![2, 9, 3, 4, 5, 3, 0, 0]);
        let type_ids: Vec<i64> = encoded.type_ids.iter().copied().collect();
        assert_eq!(type_ids, vec![0, 0, 0, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_missing_special_tokens_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "hello").unwrap();
        writeln!(file, "[UNK]").unwrap();
        let err = BertTokenizer::from_vocab_file(file.path()).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
