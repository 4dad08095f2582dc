//! Classification result mapping.
//!
//! Turns a raw score tensor into ordered, labeled [`Classifications`],
//! applying label allow/deny filtering first, then sorting by descending
//! score, then dropping low-confidence entries and truncating to the
//! configured maximum.

use std::collections::HashSet;

use ndarray::ArrayD;

use crate::core::errors::{TaskError, TaskResult};
use crate::core::labels::LabelMap;
use crate::core::options::ClassificationOptions;
use crate::core::results::{Category, Classifications};

/// Extracts the per-class score slice from a classification head tensor.
///
/// Accepts the `[N]`, `[1, N]` and `[1, 1, 1, N]` layouts classification
/// heads come in; anything else is a processing error.
pub fn scores_from_tensor(tensor: &ArrayD<f32>) -> TaskResult<Vec<f32>> {
    match tensor.shape() {
        [_] | [1, _] | [1, 1, 1, _] => Ok(tensor.iter().copied().collect()),
        shape => Err(TaskError::post_processing_message(format!(
            "expected a [1, N] classification tensor, got shape {shape:?}"
        ))),
    }
}

/// Set of allowed or denied class names, resolved against the label map at
/// construction time.
#[derive(Debug, Clone)]
pub(crate) struct ClassNameSet {
    values: HashSet<String>,
    is_allowlist: bool,
}

impl ClassNameSet {
    /// Resolves the allow/deny lists of the options against a label map.
    ///
    /// Returns `None` when neither list is set. Unknown and duplicate names
    /// are ignored; if nothing remains, or labels are missing entirely, an
    /// `InvalidArgument` error is raised.
    pub(crate) fn from_options(
        options: &ClassificationOptions,
        labels: &LabelMap,
    ) -> TaskResult<Option<Self>> {
        if options.category_allowlist.is_empty() && options.category_denylist.is_empty() {
            return Ok(None);
        }
        if labels.is_empty() {
            return Err(TaskError::invalid_argument(
                "using `category_allowlist` or `category_denylist` requires labels \
                 to be present, but the model ships none",
            ));
        }

        let is_allowlist = !options.category_allowlist.is_empty();
        let requested = if is_allowlist {
            &options.category_allowlist
        } else {
            &options.category_denylist
        };

        // Duplicate or unknown class names are ignored.
        let values: HashSet<String> = requested
            .iter()
            .filter(|name| labels.contains_name(name))
            .cloned()
            .collect();

        if values.is_empty() {
            return Err(TaskError::invalid_argument(format!(
                "invalid class names specified via `category_{}`: none match the model labels",
                if is_allowlist { "allowlist" } else { "denylist" }
            )));
        }

        Ok(Some(Self {
            values,
            is_allowlist,
        }))
    }

    /// Returns true when the class at `index` passes the filter.
    pub(crate) fn allows(&self, labels: &LabelMap, index: usize) -> bool {
        let name = labels.get(index).map(|item| item.name.as_str()).unwrap_or("");
        self.values.contains(name) == self.is_allowlist
    }
}

/// Maps raw classification scores to categories.
///
/// Built once per task from validated options and the model's label map;
/// `process` is then called per inference with the head's score slice.
#[derive(Debug, Clone)]
pub struct ClassificationPostprocessor {
    labels: LabelMap,
    max_results: usize,
    score_threshold: f32,
    class_name_set: Option<ClassNameSet>,
}

impl ClassificationPostprocessor {
    /// Creates a postprocessor from validated options and a label map.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the options fail
    /// validation, when an allow/deny list is supplied without labels, or
    /// when none of the listed names match the label map. All of this is
    /// checked before any inference call.
    pub fn new(options: &ClassificationOptions, labels: LabelMap) -> TaskResult<Self> {
        options.validate()?;

        let class_name_set = ClassNameSet::from_options(options, &labels)?;
        let max_results = if options.max_results < 0 {
            usize::MAX
        } else {
            options.max_results as usize
        };

        Ok(Self {
            labels,
            max_results,
            score_threshold: options.effective_threshold(),
            class_name_set,
        })
    }

    fn is_allowed(&self, index: usize) -> bool {
        match &self.class_name_set {
            Some(set) => set.allows(&self.labels, index),
            None => true,
        }
    }

    fn category(&self, index: usize, score: f32) -> Category {
        match self.labels.get(index) {
            Some(item) => Category {
                index,
                score,
                label: item.name.clone(),
                display_name: item.display_name.clone(),
            },
            None => Category::unlabeled(index, score),
        }
    }

    /// Maps one head's score slice to ordered categories.
    ///
    /// # Arguments
    ///
    /// * `scores` - One score per class, in class-index order.
    /// * `head_index` - Index of the output head that produced the scores.
    ///
    /// # Errors
    ///
    /// Returns a processing error when the model's class count does not
    /// match the label map.
    pub fn process(&self, scores: &[f32], head_index: usize) -> TaskResult<Classifications> {
        if !self.labels.is_empty() && self.labels.len() != scores.len() {
            return Err(TaskError::post_processing_message(format!(
                "got {} class score(s), expected {} according to the label map",
                scores.len(),
                self.labels.len()
            )));
        }

        let mut score_pairs: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        score_pairs
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut categories = Vec::new();
        for (index, score) in score_pairs {
            if score < self.score_threshold || categories.len() >= self.max_results {
                break;
            }
            if !self.is_allowed(index) {
                continue;
            }
            categories.push(self.category(index, score));
        }

        Ok(Classifications {
            head_index,
            categories,
        })
    }
}
