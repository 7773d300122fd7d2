pub const WHISPER_MODEL_BASE_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Whisper expects 16 kHz mono input.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

pub const DEFAULT_LANGUAGE: &str = "zh";

/// Upper bound on inference threads when none are configured.
pub const MAX_DEFAULT_THREADS: usize = 4;

pub const APP_DIR_NAME: &str = "speechcheck";
