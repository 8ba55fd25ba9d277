use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use log::{error, info};

use super::classifier::TransactionClassifier;
use super::encoder::{Encoder, OnnxEncoder};
use super::error::ClassifierError;
use super::head::LinearHead;
use super::label_map::LabelMap;
use super::tokenize::{SequenceTokenizer, MAX_SEQUENCE_LENGTH};
use crate::artifacts::{ArtifactKind, ArtifactManager};
use crate::runtime::RuntimeConfig;

/// A builder for constructing a TransactionClassifier with a fluent interface.
#[derive(Debug)]
pub struct ClassifierBuilder {
    tokenizer: Option<Tokenizer>,
    tokenizer_path: Option<String>,
    encoder: Option<Arc<dyn Encoder>>,
    encoder_path: Option<String>,
    head: Option<LinearHead>,
    labels: Option<LabelMap>,
    max_sequence_length: usize,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder with a 32-token sequence length
    pub fn new() -> Self {
        Self {
            tokenizer: None,
            tokenizer_path: None,
            encoder: None,
            encoder_path: None,
            head: None,
            labels: None,
            max_sequence_length: MAX_SEQUENCE_LENGTH,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration used when an ONNX encoder is loaded.
    /// Must be called before [`with_onnx_encoder`](Self::with_onnx_encoder) to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Result<Self, ClassifierError> {
        if self.tokenizer.is_some() {
            return Err(ClassifierError::BuildError("Tokenizer already set".to_string()));
        }
        self.tokenizer = Some(tokenizer);
        Ok(self)
    }

    pub fn with_tokenizer_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer {:?}: {}", path, e))
        })?;
        info!("Tokenizer loaded from {:?}", path);

        let mut builder = self.with_tokenizer(tokenizer)?;
        builder.tokenizer_path = Some(path.to_string_lossy().to_string());
        Ok(builder)
    }

    /// Uses a caller-supplied encoder in place of an ONNX model.
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Result<Self, ClassifierError> {
        if self.encoder.is_some() {
            return Err(ClassifierError::BuildError("Encoder already set".to_string()));
        }
        self.encoder = Some(encoder);
        Ok(self)
    }

    pub fn with_onnx_encoder<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let encoder = OnnxEncoder::from_file(path, &self.runtime_config)?;

        let mut builder = self.with_encoder(Arc::new(encoder))?;
        builder.encoder_path = Some(path.to_string_lossy().to_string());
        Ok(builder)
    }

    pub fn with_head(mut self, head: LinearHead) -> Self {
        self.head = Some(head);
        self
    }

    pub fn with_head_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let head = LinearHead::from_file(path)?;
        info!("Classification head loaded ({} -> {})", head.in_features(), head.out_features());
        Ok(self.with_head(head))
    }

    pub fn with_label_map(mut self, labels: LabelMap) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_label_map_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let labels = LabelMap::from_file(path)?;
        info!("Label map loaded with {} categories", labels.len());
        Ok(self.with_label_map(labels))
    }

    /// Loads the tokenizer, encoder, head and label map from an artifacts directory.
    ///
    /// The artifacts must already be present; see [`ArtifactManager::ensure_present`].
    pub fn with_artifacts(self, artifacts: &ArtifactManager) -> Result<Self, ClassifierError> {
        let missing = artifacts.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|kind| kind.file_name()).collect();
            return Err(ClassifierError::BuildError(format!(
                "Artifacts missing from {:?}: {}. Download them first using ArtifactManager::ensure_present()",
                artifacts.artifacts_dir(),
                names.join(", ")
            )));
        }

        self.with_tokenizer_file(artifacts.path(ArtifactKind::Tokenizer))?
            .with_onnx_encoder(artifacts.path(ArtifactKind::Encoder))?
            .with_head_file(artifacts.path(ArtifactKind::Head))?
            .with_label_map_file(artifacts.path(ArtifactKind::LabelMap))
    }

    /// Builds the classifier, checking that every part agrees on shapes.
    ///
    /// One sample input is run through the encoder to confirm its hidden size matches
    /// the head's input width.
    pub fn build(self) -> Result<TransactionClassifier, ClassifierError> {
        let tokenizer = self.tokenizer
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?;
        let encoder = self.encoder
            .ok_or_else(|| ClassifierError::BuildError("No encoder loaded".into()))?;
        let head = self.head
            .ok_or_else(|| ClassifierError::BuildError("No classification head loaded".into()))?;
        let labels = self.labels
            .ok_or_else(|| ClassifierError::BuildError("No label map loaded".into()))?;

        if head.out_features() != labels.len() {
            return Err(ClassifierError::BuildError(format!(
                "Head produces {} scores but the label map has {} categories",
                head.out_features(),
                labels.len()
            )));
        }

        let tokenizer = SequenceTokenizer::new(tokenizer, self.max_sequence_length)?;

        let sample = tokenizer.encode("")?;
        let hidden = encoder.encode(&sample)?;
        if hidden.len() != head.in_features() {
            return Err(ClassifierError::BuildError(format!(
                "Encoder hidden size {} does not match head input width {}",
                hidden.len(),
                head.in_features()
            )));
        }
        info!(
            "Classifier ready: {} categories, hidden size {}, sequence length {}",
            labels.len(),
            hidden.len(),
            tokenizer.max_length()
        );

        Ok(TransactionClassifier {
            tokenizer,
            encoder,
            head,
            labels,
            tokenizer_path: self.tokenizer_path,
            encoder_path: self.encoder_path,
        })
    }
}
