use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while loading or running the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Error occurred while loading or using the tokenizer
    TokenizerError(String),
    /// Error occurred while loading or running the encoder
    ModelError(String),
    /// Error occurred while reading or parsing an artifact (head weights, label map)
    ArtifactError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while turning logits into a prediction
    PredictionError(String),
    /// Error occurred due to inconsistent or invalid data
    ValidationError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenizerError(msg) => write!(f, "Tokenizer error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::ArtifactError(msg) => write!(f, "Artifact error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}

impl From<tokenizers::Error> for ClassifierError {
    fn from(err: tokenizers::Error) -> Self {
        ClassifierError::TokenizerError(err.to_string())
    }
}
