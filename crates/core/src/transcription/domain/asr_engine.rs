use std::path::Path;

use thiserror::Error;

use super::inference_options::InferenceOptions;
use super::model_tier::ModelTier;
use super::segment::RawResult;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to load {tier} model: {message}")]
    Load { tier: ModelTier, message: String },
    #[error("{0}")]
    Infer(String),
}

/// Domain interface for an ASR engine that can load model weights.
///
/// Loading is expensive and the returned handle owns the weights, so each
/// request loads its own handle and releases it before returning.
pub trait AsrEngine: Send {
    fn load_engine(&self, tier: ModelTier) -> Result<Box<dyn EngineHandle>, EngineError>;
}

/// A loaded model, exclusively owned by one in-flight request.
pub trait EngineHandle: Send {
    /// Run inference over a whole audio file. Blocks until the engine finishes.
    fn infer(
        &mut self,
        audio_path: &Path,
        options: &InferenceOptions,
    ) -> Result<RawResult, EngineError>;

    /// Free the loaded weights. Must be idempotent.
    fn release(&mut self);
}
