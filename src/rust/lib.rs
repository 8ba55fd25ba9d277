//! Transaction description classifier served over HTTP.
//!
//! A frozen pretrained encoder (ONNX) feeds a linear head that scores a fixed set of
//! spending categories. Everything is loaded once at startup and shared read-only
//! across requests.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use spendsort::{ArtifactManager, ArtifactSource, TransactionClassifier};
//!
//! let artifacts = ArtifactManager::new_default()?
//!     .with_source(ArtifactSource::new("https://artifacts.example/spendsort"));
//! artifacts.ensure_present().await?;
//!
//! let classifier = TransactionClassifier::builder()
//!     .with_artifacts(&artifacts)?
//!     .build()?;
//!
//! let result = classifier.classify("STARBUCKS COFFEE #2198")?;
//! println!("{}: {:.2}", result.category, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod io_struct;
mod runtime;
pub mod server;

pub use artifacts::{ArtifactError, ArtifactKind, ArtifactManager, ArtifactSource};
pub use classifier::{
    Classification, ClassifierBuilder, ClassifierError, ClassifierInfo, Encoder, LabelMap, LinearHead,
    OnnxEncoder, Prediction, SequenceTokenizer, TokenizedInput, TransactionClassifier, MAX_SEQUENCE_LENGTH,
};
pub use runtime::RuntimeConfig;
pub use server::{AppState, ServerConfig};

/// Initialises `env_logger` with an `info` default, overridable through `RUST_LOG`.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
