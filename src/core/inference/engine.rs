//! Engine invocation.
//!
//! [`OrtEngine`] owns one engine session per task instance. Calls are
//! synchronous and blocking; the interior mutex serializes them, so a task
//! instance should be treated as owned by a single caller context at a time.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::{Array2, ArrayD, ArrayViewD, IxDyn};
use ort::session::Session;
use ort::value::{TensorRef, ValueType};

use crate::core::errors::{OpaqueError, TaskError, TaskResult};
use crate::core::options::BaseOptions;

use super::session::load_session;

/// A named raw output tensor, as reported by the engine.
#[derive(Debug, Clone)]
pub struct OutputTensor {
    /// Output name declared by the model.
    pub name: String,
    /// Tensor data, converted to f32.
    pub array: ArrayD<f32>,
}

/// Raw output tensors of one inference call, in model-declared order.
#[derive(Debug, Clone)]
pub struct EngineOutputs {
    tensors: Vec<OutputTensor>,
}

impl EngineOutputs {
    /// Returns the output with the given name.
    pub fn by_name(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors
            .iter()
            .find(|t| t.name == name)
            .map(|t| &t.array)
    }

    /// Returns the output at the given position in model-declared order.
    pub fn by_index(&self, index: usize) -> Option<&ArrayD<f32>> {
        self.tensors.get(index).map(|t| &t.array)
    }

    /// Returns the first output, failing when the model produced none.
    pub fn primary(&self) -> TaskResult<&ArrayD<f32>> {
        self.by_index(0)
            .ok_or_else(|| TaskError::post_processing_message("model produced no output tensors"))
    }

    /// Number of extracted output tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns true when no output tensor was extracted.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

/// Inference invoker backed by a single engine session.
pub struct OrtEngine {
    session: Mutex<Session>,
    input_names: Vec<String>,
    input_shapes: Vec<Vec<i64>>,
    output_names: Vec<String>,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEngine")
            .field("input_names", &self.input_names)
            .field("output_names", &self.output_names)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtEngine {
    /// Loads the model named by the base options into a fresh session.
    ///
    /// This is the expensive step of a task's lifecycle; inference calls
    /// afterwards are stateless.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::ModelLoad` when the model file is missing or
    /// rejected by the engine.
    pub fn from_options(options: &BaseOptions) -> TaskResult<Self> {
        options.validate()?;
        let path = &options.model_path;
        let session = load_session(path, &options.session)?;

        let input_names = session.inputs.iter().map(|i| i.name.clone()).collect();
        let input_shapes = session
            .inputs
            .iter()
            .map(|i| match &i.input_type {
                ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
                _ => Vec::new(),
            })
            .collect();
        let output_names = session.outputs.iter().map(|o| o.name.clone()).collect();
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        tracing::debug!(model = %model_name, path = %path.display(), "engine session created");

        Ok(Self {
            session: Mutex::new(session),
            input_names,
            input_shapes,
            output_names,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model name derived from the file stem.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the model path associated with this engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model-declared input names.
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    /// Returns the declared shape of the input at the given position.
    /// Dynamic dimensions are reported as negative values.
    pub fn input_shape(&self, index: usize) -> Option<&[i64]> {
        self.input_shapes.get(index).map(|s| s.as_slice())
    }

    /// Runs inference with a single f32 input tensor, fed to the model's
    /// first input.
    ///
    /// # Arguments
    ///
    /// * `input` - Input tensor, typically `[1, C, H, W]` for vision models
    ///   or `[1, samples]` for audio models.
    ///
    /// # Returns
    ///
    /// All f32-convertible output tensors in model-declared order.
    pub fn run_f32(&self, input: &ArrayD<f32>) -> TaskResult<EngineOutputs> {
        let input_name = self.require_input(0)?.to_string();
        let input_shape: Vec<usize> = input.shape().to_vec();

        let mut session = self.lock_session()?;
        let input_tensor = TensorRef::from_array_view(input.view()).map_err(|e| {
            TaskError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| {
                TaskError::inference_error(
                    &self.model_name,
                    &format!("engine run failed for input '{input_name}'"),
                    e,
                )
            })?;
        self.extract_f32_outputs(&outputs)
    }

    /// Runs inference with the id/mask(/segment) i64 triple used by
    /// BERT-style text models. Tensors are fed to the model's inputs in
    /// declared order: ids first, then mask, then segment ids.
    pub fn run_ids(
        &self,
        ids: &Array2<i64>,
        mask: &Array2<i64>,
        type_ids: Option<&Array2<i64>>,
    ) -> TaskResult<EngineOutputs> {
        let ids_name = self.require_input(0)?.to_string();
        let mask_name = self.require_input(1)?.to_string();

        let mut session = self.lock_session()?;
        let ids_tensor = TensorRef::from_array_view(ids.view())
            .map_err(|e| TaskError::inference_error(&self.model_name, "failed to convert ids", e))?;
        let mask_tensor = TensorRef::from_array_view(mask.view()).map_err(|e| {
            TaskError::inference_error(&self.model_name, "failed to convert mask", e)
        })?;

        let outputs = match type_ids {
            Some(type_ids) => {
                let type_name = self.require_input(2)?.to_string();
                let type_tensor = TensorRef::from_array_view(type_ids.view()).map_err(|e| {
                    TaskError::inference_error(&self.model_name, "failed to convert segment ids", e)
                })?;
                session
                    .run(ort::inputs![
                        ids_name.as_str() => ids_tensor,
                        mask_name.as_str() => mask_tensor,
                        type_name.as_str() => type_tensor
                    ])
                    .map_err(|e| {
                        TaskError::inference_error(
                            &self.model_name,
                            "engine run failed for id/mask/segment inputs",
                            e,
                        )
                    })?
            }
            None => session
                .run(ort::inputs![
                    ids_name.as_str() => ids_tensor,
                    mask_name.as_str() => mask_tensor
                ])
                .map_err(|e| {
                    TaskError::inference_error(
                        &self.model_name,
                        "engine run failed for id/mask inputs",
                        e,
                    )
                })?,
        };
        self.extract_f32_outputs(&outputs)
    }

    fn require_input(&self, index: usize) -> TaskResult<&str> {
        self.input_names.get(index).map(|s| s.as_str()).ok_or_else(|| {
            TaskError::inference_error(
                &self.model_name,
                &format!(
                    "model declares {} input(s), input #{} is required",
                    self.input_names.len(),
                    index
                ),
                OpaqueError("missing model input".to_string()),
            )
        })
    }

    fn lock_session(&self) -> TaskResult<std::sync::MutexGuard<'_, Session>> {
        self.session.lock().map_err(|_| {
            TaskError::inference_error(
                &self.model_name,
                "failed to acquire session lock",
                OpaqueError("session lock poisoned".to_string()),
            )
        })
    }

    fn extract_f32_outputs(
        &self,
        outputs: &ort::session::SessionOutputs,
    ) -> TaskResult<EngineOutputs> {
        let mut tensors = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            match outputs[name.as_str()].try_extract_tensor::<f32>() {
                Ok((shape, data)) => {
                    let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
                    let array = ArrayViewD::from_shape(IxDyn(&dims), data)
                        .map_err(TaskError::Tensor)?
                        .to_owned();
                    tensors.push(OutputTensor {
                        name: name.clone(),
                        array,
                    });
                }
                Err(_) => {
                    // Non-f32 outputs (e.g. string or integer side outputs)
                    // are not consumed by any mapper in this crate.
                    tracing::debug!(model = %self.model_name, output = %name, "skipping non-f32 output");
                }
            }
        }
        if tensors.is_empty() {
            return Err(TaskError::inference_error(
                &self.model_name,
                "no f32 output tensor could be extracted",
                OpaqueError("unsupported model output types".to_string()),
            ));
        }
        Ok(EngineOutputs { tensors })
    }
}
