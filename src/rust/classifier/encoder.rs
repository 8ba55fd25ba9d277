use ndarray::{s, Array1, Array2, ArrayViewD};
use ort::session::Session;
use ort::value::Tensor;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::error::ClassifierError;
use super::tokenize::TokenizedInput;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// The frozen text encoder behind the classification head.
///
/// Implementations map a fixed-length token sequence to the hidden state at the
/// first (`[CLS]`) position. They must be deterministic and must not mutate any
/// state, since a single instance serves all requests concurrently.
pub trait Encoder: Send + Sync + fmt::Debug {
    fn encode(&self, input: &TokenizedInput) -> Result<Array1<f32>, ClassifierError>;
}

/// Encoder backed by an ONNX Runtime session.
///
/// # Model Input Format
/// - `input_ids`: token ids, i64 `[batch_size=1, sequence_length]`
/// - `attention_mask`: 1 for real tokens, 0 for padding, i64 `[1, sequence_length]`
///
/// # Model Output Format
/// - First output is the last hidden state `[1, sequence_length, hidden_size]`
#[derive(Debug)]
pub struct OnnxEncoder {
    session: Session,
}

impl OnnxEncoder {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::BuildError(format!("Encoder file not found: {:?}", path)));
        }

        let session = create_session_builder(config)?.commit_from_file(path)?;
        Self::validate_model(&session)?;
        log::info!("Encoder loaded from {:?}", path);

        Ok(Self { session })
    }

    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        check_signature(
            session.inputs.iter().map(|input| input.name.as_str()),
            session.outputs.len(),
        )
    }
}

/// Requires the `input_ids` and `attention_mask` inputs and at least one output.
fn check_signature<'a, I>(inputs: I, num_outputs: usize) -> Result<(), ClassifierError>
where
    I: IntoIterator<Item = &'a str>,
{
    let inputs: Vec<&str> = inputs.into_iter().collect();
    for required in ["input_ids", "attention_mask"] {
        if !inputs.contains(&required) {
            return Err(ClassifierError::ModelError(format!(
                "Encoder is missing the '{}' input",
                required
            )));
        }
    }

    if num_outputs == 0 {
        return Err(ClassifierError::ModelError(
            "Encoder must have at least 1 output for the hidden state".to_string(),
        ));
    }

    Ok(())
}

/// Takes the `[CLS]` row out of a `[1, sequence_length, hidden_size]` hidden state.
fn cls_representation(hidden: ArrayViewD<'_, f32>) -> Result<Array1<f32>, ClassifierError> {
    let shape = hidden.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] == 0 {
        return Err(ClassifierError::ModelError(format!(
            "Unexpected hidden state shape {:?}, expected [1, sequence_length, hidden_size]",
            shape
        )));
    }

    let cls = hidden.slice(s![0, 0, ..]);
    Ok(Array1::from_iter(cls.iter().cloned()))
}

impl Encoder for OnnxEncoder {
    fn encode(&self, input: &TokenizedInput) -> Result<Array1<f32>, ClassifierError> {
        let len = input.len();

        let input_ids = Array2::from_shape_vec((1, len), input.input_ids.clone())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let attention_mask = Array2::from_shape_vec((1, len), input.attention_mask.clone())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(input_ids)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(attention_mask)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?,
        );

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let hidden = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        cls_representation(hidden)
    }
}
