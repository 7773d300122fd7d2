use std::path::{Path, PathBuf};

use super::model_tier::ModelTier;
use crate::shared::constants::DEFAULT_LANGUAGE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio_path: PathBuf,
    pub model_tier: ModelTier,
    /// Language code handed to the engine, e.g. "zh" or "en".
    pub language_hint: String,
}

impl TranscriptionRequest {
    /// Request with the default tier and language.
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            audio_path: audio_path.into(),
            model_tier: ModelTier::default(),
            language_hint: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_model_tier(mut self, tier: ModelTier) -> Self {
        self.model_tier = tier;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language_hint = language.to_string();
        self
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }
}
