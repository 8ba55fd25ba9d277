use std::collections::HashMap;
use std::sync::Arc;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::encoder::Encoder;
use super::error::ClassifierError;
use super::head::LinearHead;
use super::label_map::LabelMap;
use super::tokenize::SequenceTokenizer;
use super::utils::{argmax, softmax};

/// The category chosen for a description and the probability mass assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub confidence: f32,
}

/// A classification together with the full probability distribution over categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub category: String,
    pub confidence: f32,
    pub scores: HashMap<String, f32>,
}

impl From<Prediction> for Classification {
    fn from(prediction: Prediction) -> Self {
        Self {
            category: prediction.category,
            confidence: prediction.confidence,
        }
    }
}

/// A thread-safe transaction classifier: a frozen encoder, a linear head and a fixed label map.
///
/// All state is immutable after [`ClassifierBuilder::build`](super::ClassifierBuilder::build),
/// so one instance can be shared behind an `Arc` and called from any number of threads:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use spendsort::{ArtifactManager, TransactionClassifier};
/// use std::sync::Arc;
///
/// let artifacts = ArtifactManager::new_default()?;
/// let classifier = Arc::new(TransactionClassifier::builder().with_artifacts(&artifacts)?.build()?);
///
/// let result = classifier.classify("STARBUCKS COFFEE #2198")?;
/// println!("{} ({:.2})", result.category, result.confidence);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TransactionClassifier {
    pub(crate) tokenizer: SequenceTokenizer,
    pub(crate) encoder: Arc<dyn Encoder>,
    pub(crate) head: LinearHead,
    pub(crate) labels: LabelMap,
    pub(crate) tokenizer_path: Option<String>,
    pub(crate) encoder_path: Option<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<TransactionClassifier>();
    }
};

impl TransactionClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            tokenizer_path: self.tokenizer_path.clone(),
            encoder_path: self.encoder_path.clone(),
            num_classes: self.labels.len(),
            class_labels: self.labels.labels().to_vec(),
            hidden_size: self.head.in_features(),
            max_sequence_length: self.tokenizer.max_length(),
        }
    }

    /// Category names ordered by class index.
    pub fn categories(&self) -> &[String] {
        self.labels.labels()
    }

    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.tokenizer.count_tokens(text)
    }

    /// Runs the full forward pass and returns one raw score per category.
    pub fn logits(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let input = self.tokenizer.encode(text)?;
        let hidden = self.encoder.encode(&input)?;
        self.head.forward(hidden.view())
    }

    /// Predicts the category of `text` and returns the probability of every category.
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let logits = self.logits(text)?;
        let probabilities = softmax(&logits);

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::PredictionError(
                "Model produced non-finite scores".to_string(),
            ));
        }

        let (index, confidence) = argmax(&probabilities)
            .ok_or_else(|| ClassifierError::PredictionError("Model produced no scores".to_string()))?;
        let category = self.labels.label(index)
            .ok_or_else(|| ClassifierError::PredictionError(format!("No category for class index {}", index)))?
            .to_string();

        let scores = self.labels.labels().iter()
            .cloned()
            .zip(probabilities.iter().cloned())
            .collect();

        Ok(Prediction { category, confidence, scores })
    }

    /// Classifies a single transaction description.
    pub fn classify(&self, description: &str) -> Result<Classification, ClassifierError> {
        self.predict(description).map(Classification::from)
    }
}
