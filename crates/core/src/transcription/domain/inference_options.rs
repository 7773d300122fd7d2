/// Options passed to the engine for a single inference call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceOptions {
    pub language: String,
    /// Disable half precision and hardware acceleration.
    pub force_full_precision: bool,
    pub verbose: bool,
}

impl InferenceOptions {
    /// CPU-safe options: full precision, quiet engine output.
    pub fn for_language(language: &str) -> Self {
        Self {
            language: language.to_string(),
            force_full_precision: true,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_language_forces_full_precision_and_silences_engine() {
        let opts = InferenceOptions::for_language("zh");
        assert_eq!(opts.language, "zh");
        assert!(opts.force_full_precision);
        assert!(!opts.verbose);
    }
}
