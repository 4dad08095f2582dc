//! Nearest-neighbor search over a pre-built embedding index.
//!
//! The index is a read-only artifact built offline: a list of feature
//! vectors of a fixed dimension, each carrying an opaque metadata string.
//! Search is an exhaustive scan by squared L2 distance, ascending.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{TaskError, TaskResult};
use crate::core::results::{NearestNeighbor, SearchResult};

/// A pre-built nearest-neighbor index over feature vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    /// Dimension of every indexed vector.
    dim: usize,
    /// One metadata string per indexed vector.
    metadata: Vec<String>,
    /// Indexed vectors, all of length `dim`.
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Creates an empty index for vectors of the given dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            metadata: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Adds a vector with its metadata to the index.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Index` when the vector dimension does not match
    /// the index.
    pub fn add(&mut self, metadata: impl Into<String>, vector: Vec<f32>) -> TaskResult<()> {
        if vector.len() != self.dim {
            return Err(TaskError::index_error(format!(
                "cannot index a {}-dimensional vector into a {}-dimensional index",
                vector.len(),
                self.dim
            )));
        }
        self.metadata.push(metadata.into());
        self.vectors.push(vector);
        Ok(())
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true when the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension of the indexed vectors.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Loads an index from its JSON serialization.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Index` when the file cannot be read, parsed, or
    /// is internally inconsistent.
    pub fn from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaskError::index_error(format!(
                "failed to read index file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let index: Self = serde_json::from_str(&content).map_err(|e| {
            TaskError::index_error(format!(
                "failed to parse index file '{}': {}",
                path.display(),
                e
            ))
        })?;
        index.check_consistency()?;
        Ok(index)
    }

    /// Writes the index to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> TaskResult<()> {
        let content = serde_json::to_string(self)
            .map_err(|e| TaskError::index_error(format!("failed to serialize index: {e}")))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    fn check_consistency(&self) -> TaskResult<()> {
        if self.metadata.len() != self.vectors.len() {
            return Err(TaskError::index_error(format!(
                "index holds {} metadata entries for {} vectors",
                self.metadata.len(),
                self.vectors.len()
            )));
        }
        if let Some(bad) = self.vectors.iter().find(|v| v.len() != self.dim) {
            return Err(TaskError::index_error(format!(
                "index declares dimension {} but holds a vector of length {}",
                self.dim,
                bad.len()
            )));
        }
        Ok(())
    }

    /// Finds the nearest neighbors of a query vector.
    ///
    /// # Arguments
    ///
    /// * `query` - Query vector; must match the index dimension.
    /// * `max_results` - Number of neighbors to return.
    ///
    /// # Returns
    ///
    /// Up to `max_results` neighbors, closest (smallest squared L2
    /// distance) first.
    pub fn nearest_neighbors(&self, query: &[f32], max_results: usize) -> TaskResult<SearchResult> {
        if query.len() != self.dim {
            return Err(TaskError::index_error(format!(
                "query embedding has dimension {}, index expects {}",
                query.len(),
                self.dim
            )));
        }

        let mut neighbors: Vec<NearestNeighbor> = self
            .vectors
            .iter()
            .zip(&self.metadata)
            .map(|(vector, metadata)| NearestNeighbor {
                metadata: metadata.clone(),
                distance: vector
                    .iter()
                    .zip(query)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum(),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(max_results);

        Ok(SearchResult {
            nearest_neighbors: neighbors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn index() -> EmbeddingIndex {
        let mut index = EmbeddingIndex::new(2);
        index.add("origin", vec![0.0, 0.0]).unwrap();
        index.add("unit-x", vec![1.0, 0.0]).unwrap();
        index.add("far", vec![10.0, 10.0]).unwrap();
        index
    }

    #[test]
    fn test_neighbors_ascending_distance() {
        let result = index().nearest_neighbors(&[0.1, 0.0], 3).unwrap();
        let names: Vec<&str> = result
            .nearest_neighbors
            .iter()
            .map(|n| n.metadata.as_str())
            .collect();
        assert_eq!(names, vec!["origin", "unit-x", "far"]);
        assert!(result.nearest_neighbors[0].distance <= result.nearest_neighbors[1].distance);
    }

    #[test]
    fn test_truncates_to_max_results() {
        let result = index().nearest_neighbors(&[0.0, 0.0], 2).unwrap();
        assert_eq!(result.nearest_neighbors.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = index().nearest_neighbors(&[0.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, TaskError::Index { .. }));
    }

    #[test]
    fn test_add_checks_dimension() {
        let mut index = EmbeddingIndex::new(2);
        assert!(index.add("bad", vec![1.0]).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        index().to_file(file.path()).unwrap();

        let loaded = EmbeddingIndex::from_file(file.path()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.dim(), 2);
        let result = loaded.nearest_neighbors(&[1.0, 0.0], 1).unwrap();
        assert_eq!(result.nearest_neighbors[0].metadata, "unit-x");
    }

    #[test]
    fn test_inconsistent_file_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"dim":3,"metadata":["a"],"vectors":[[1.0,2.0]]}"#,
        )
        .unwrap();
        let err = EmbeddingIndex::from_file(file.path()).unwrap_err();
        assert!(matches!(err, TaskError::Index { .. }));
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = EmbeddingIndex::from_file("/nonexistent/index.json").unwrap_err();
        assert!(matches!(err, TaskError::Index { .. }));
    }
}
