//! Label map loading.
//!
//! Models that classify or detect ship a plain-text label file with one
//! class name per line, optionally paired with a display-name file of the
//! same length for a specific locale.

use std::io::BufRead;
use std::path::Path;

use crate::core::errors::{TaskError, TaskResult};
use crate::core::options::BaseOptions;

/// One entry of a label map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapItem {
    /// Class name. Empty when the model ships no labels.
    pub name: String,
    /// Optional localized display name.
    pub display_name: Option<String>,
}

/// An ordered mapping from class index to label.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    items: Vec<LabelMapItem>,
}

impl LabelMap {
    /// Creates an empty label map. Results built against it carry only
    /// class indices.
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates a label map from a list of class names.
    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            items: names
                .into_iter()
                .map(|name| LabelMapItem {
                    name,
                    display_name: None,
                })
                .collect(),
        }
    }

    /// Reads a label map from a reader with one label per line.
    ///
    /// Empty lines are preserved as empty labels so that line number and
    /// class index stay aligned.
    pub fn from_reader(reader: impl BufRead) -> TaskResult<Self> {
        let mut items = Vec::new();
        for line in reader.lines() {
            items.push(LabelMapItem {
                name: line?,
                display_name: None,
            });
        }
        Ok(Self { items })
    }

    /// Reads a label map from a file with one label per line.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the label file.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaskError::invalid_argument(format!(
                "failed to read label file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_names(
            content.lines().map(|s| s.to_string()).collect(),
        ))
    }

    /// Attaches display names read from a locale file with one name per
    /// line. The file must have exactly as many lines as there are labels.
    pub fn with_display_names_from_file(mut self, path: impl AsRef<Path>) -> TaskResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaskError::invalid_argument(format!(
                "failed to read display-name file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let names: Vec<&str> = content.lines().collect();
        if names.len() != self.items.len() {
            return Err(TaskError::invalid_argument(format!(
                "display-name file '{}' has {} entries, expected {} to match the label map",
                path.display(),
                names.len(),
                self.items.len()
            )));
        }
        for (item, display_name) in self.items.iter_mut().zip(names) {
            item.display_name = Some(display_name.to_string());
        }
        Ok(self)
    }

    /// Returns the entry for a class index.
    pub fn get(&self, index: usize) -> Option<&LabelMapItem> {
        self.items.get(index)
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when the map holds no labels.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the entries in class-index order.
    pub fn iter(&self) -> impl Iterator<Item = &LabelMapItem> {
        self.items.iter()
    }

    /// Returns true if any entry matches the given class name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    /// Loads the label map named by a task's base options.
    ///
    /// Returns an empty map when no label file is configured; attaches
    /// display names when a display-name file is configured as well.
    pub fn from_base_options(options: &BaseOptions) -> TaskResult<Self> {
        let Some(labels_path) = &options.labels_path else {
            return Ok(Self::empty());
        };
        let map = Self::from_file(labels_path)?;
        match &options.display_names_path {
            Some(path) => map.with_display_names_from_file(path),
            None => Ok(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_reader_preserves_empty_lines() {
        let data = "cat\n\ndog";
        let map = LabelMap::from_reader(data.as_bytes()).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(0).unwrap().name, "cat");
        assert_eq!(map.get(1).unwrap().name, "");
        assert_eq!(map.get(2).unwrap().name, "dog");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "background").unwrap();
        writeln!(file, "person").unwrap();

        let map = LabelMap::from_file(file.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_name("person"));
        assert!(!map.contains_name("bicycle"));
    }

    #[test]
    fn test_from_missing_file() {
        let result = LabelMap::from_file("/nonexistent/labels.txt");
        assert!(matches!(result, Err(TaskError::InvalidArgument { .. })));
    }

    #[test]
    fn test_display_names_length_mismatch() {
        let mut labels = NamedTempFile::new().unwrap();
        writeln!(labels, "cat").unwrap();
        writeln!(labels, "dog").unwrap();
        let mut display = NamedTempFile::new().unwrap();
        writeln!(display, "Katze").unwrap();

        let result = LabelMap::from_file(labels.path())
            .unwrap()
            .with_display_names_from_file(display.path());
        assert!(matches!(result, Err(TaskError::InvalidArgument { .. })));
    }

    #[test]
    fn test_display_names_attached() {
        let mut labels = NamedTempFile::new().unwrap();
        writeln!(labels, "cat").unwrap();
        let mut display = NamedTempFile::new().unwrap();
        writeln!(display, "Katze").unwrap();

        let map = LabelMap::from_file(labels.path())
            .unwrap()
            .with_display_names_from_file(display.path())
            .unwrap();
        assert_eq!(map.get(0).unwrap().display_name.as_deref(), Some("Katze"));
    }
}
