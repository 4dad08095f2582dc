//! Engine session construction.

use std::path::Path;

use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use serde::{Deserialize, Serialize};

use crate::core::errors::{TaskError, TaskResult};

/// Graph optimization levels for the engine session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum OrtOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

impl OrtOptimizationLevel {
    fn to_ort(self) -> GraphOptimizationLevel {
        match self {
            Self::DisableAll => GraphOptimizationLevel::Disable,
            Self::Level1 => GraphOptimizationLevel::Level1,
            Self::Level2 => GraphOptimizationLevel::Level2,
            Self::Level3 => GraphOptimizationLevel::Level3,
        }
    }
}

/// Configuration for the engine session backing a task.
///
/// All knobs are optional; the engine's defaults apply when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes.
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes.
    pub inter_threads: Option<usize>,
    /// Graph optimization level.
    pub optimization_level: Option<OrtOptimizationLevel>,
}

impl OrtSessionConfig {
    /// Creates a configuration with engine defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }
}

/// Builds an engine session for the given model file, applying the session
/// configuration.
///
/// # Errors
///
/// Returns `TaskError::ModelLoad` when the model file is missing or the
/// engine rejects it.
pub fn load_session(model_path: impl AsRef<Path>, config: &OrtSessionConfig) -> TaskResult<Session> {
    let path = model_path.as_ref();
    let mut builder = Session::builder()?.with_log_level(LogLevel::Error)?;
    if let Some(threads) = config.intra_threads {
        builder = builder.with_intra_threads(threads)?;
    }
    if let Some(threads) = config.inter_threads {
        builder = builder.with_inter_threads(threads)?;
    }
    if let Some(level) = config.optimization_level {
        builder = builder.with_optimization_level(level.to_ort())?;
    }
    let session = builder.commit_from_file(path).map_err(|e| {
        TaskError::model_load_error(path, "failed to create engine session", Some(e))
    })?;
    Ok(session)
}
