use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::WHISPER_MODEL_BASE_URL;

/// Whisper model size. Larger tiers are slower and hold more memory once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown model tier '{0}', expected one of: tiny, base, small, medium, large")]
pub struct ParseModelTierError(pub String);

impl ModelTier {
    pub const ALL: &[ModelTier] = &[
        ModelTier::Tiny,
        ModelTier::Base,
        ModelTier::Small,
        ModelTier::Medium,
        ModelTier::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }

    /// File name of the ggml weights for this tier.
    pub fn model_file_name(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "ggml-tiny.bin",
            ModelTier::Base => "ggml-base.bin",
            ModelTier::Small => "ggml-small.bin",
            ModelTier::Medium => "ggml-medium.bin",
            ModelTier::Large => "ggml-large-v3.bin",
        }
    }

    pub fn model_url(&self) -> String {
        format!("{WHISPER_MODEL_BASE_URL}/{}", self.model_file_name())
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = ParseModelTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelTier::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == wanted)
            .ok_or_else(|| ParseModelTierError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::tiny("tiny", ModelTier::Tiny)]
    #[case::base("base", ModelTier::Base)]
    #[case::small("small", ModelTier::Small)]
    #[case::medium("medium", ModelTier::Medium)]
    #[case::large("large", ModelTier::Large)]
    #[case::uppercase("BASE", ModelTier::Base)]
    #[case::padded(" small ", ModelTier::Small)]
    fn test_parse(#[case] input: &str, #[case] expected: ModelTier) {
        assert_eq!(input.parse::<ModelTier>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_tier() {
        let err = "huge".parse::<ModelTier>().unwrap_err();
        assert_eq!(err, ParseModelTierError("huge".to_string()));
        assert!(err.to_string().contains("tiny, base, small, medium, large"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for tier in ModelTier::ALL {
            assert_eq!(tier.to_string().parse::<ModelTier>().unwrap(), *tier);
        }
    }

    #[test]
    fn test_default_is_base() {
        assert_eq!(ModelTier::default(), ModelTier::Base);
    }

    #[test]
    fn test_model_url_ends_with_file_name() {
        let url = ModelTier::Large.model_url();
        assert!(url.starts_with("https://"));
        assert!(url.ends_with("/ggml-large-v3.bin"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ModelTier::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let tier: ModelTier = serde_json::from_str("\"tiny\"").unwrap();
        assert_eq!(tier, ModelTier::Tiny);
    }
}
