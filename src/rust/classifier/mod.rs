mod error;
mod encoder;
mod head;
mod label_map;
mod tokenize;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use encoder::{Encoder, OnnxEncoder};
pub use head::LinearHead;
pub use label_map::LabelMap;
pub use tokenize::{SequenceTokenizer, TokenizedInput, MAX_SEQUENCE_LENGTH};
pub use classifier::{Classification, Prediction, TransactionClassifier};
pub use builder::ClassifierBuilder;

/// Information about the loaded classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the tokenizer file, if it was loaded from disk
    pub tokenizer_path: Option<String>,
    /// Path to the ONNX encoder, if one was loaded
    pub encoder_path: Option<String>,
    /// Number of categories
    pub num_classes: usize,
    /// Category names ordered by class index
    pub class_labels: Vec<String>,
    /// Width of the encoder's hidden state
    pub hidden_size: usize,
    /// Number of token positions per input
    pub max_sequence_length: usize,
}
