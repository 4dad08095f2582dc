//! Inference engine integration.
//!
//! The engine itself (graph loading, operator kernels, hardware execution
//! providers) is external; this module only builds sessions and forwards
//! validated inputs to them.

mod engine;
mod session;

pub use engine::{EngineOutputs, OrtEngine, OutputTensor};
pub use session::{OrtOptimizationLevel, OrtSessionConfig, load_session};
