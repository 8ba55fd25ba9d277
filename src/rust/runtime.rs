use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::OnceLock;

use crate::classifier::ClassifierError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime settings for the encoder session.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: optimization_level_from_u8(optimization_level_to_u8(&self.optimization_level)),
        }
    }
}

impl RuntimeConfig {
    /// Builds a config from CLI-style values, where the optimisation level is 0 (disabled) to 3.
    pub fn from_parts(inter_threads: usize, intra_threads: usize, optimization_level: u8) -> Self {
        Self {
            inter_threads,
            intra_threads,
            optimization_level: optimization_level_from_u8(optimization_level),
        }
    }
}

fn optimization_level_to_u8(level: &GraphOptimizationLevel) -> u8 {
    match level {
        GraphOptimizationLevel::Disable => 0,
        GraphOptimizationLevel::Level1 => 1,
        GraphOptimizationLevel::Level2 => 2,
        GraphOptimizationLevel::Level3 => 3,
    }
}

fn optimization_level_from_u8(level: u8) -> GraphOptimizationLevel {
    match level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init()
        .with_name("spendsort")
        .commit()?;
    Ok(())
}

/// Initialises the process-wide ONNX Runtime environment once. Later calls return the first outcome.
pub fn ensure_initialized() -> Result<(), ClassifierError> {
    INIT.get_or_init(|| init_onnx_environment().map_err(|e| e.to_string()))
        .clone()
        .map_err(|e| ClassifierError::ModelError(format!("Failed to initialize ONNX Runtime: {}", e)))
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    let opt_level = optimization_level_from_u8(optimization_level_to_u8(&config.optimization_level));
    builder = builder.with_optimization_level(opt_level)?;

    Ok(builder)
}
