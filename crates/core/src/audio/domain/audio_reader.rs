use std::path::{Path, PathBuf};

use thiserror::Error;

use super::audio_segment::AudioSegment;

#[derive(Error, Debug)]
pub enum AudioDecodeError {
    #[error("failed to open audio file {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("no audio stream in {0}")]
    NoAudioStream(PathBuf),
    #[error("failed to decode audio: {0}")]
    Decode(String),
}

/// Domain interface for decoding an audio file into inference-ready PCM.
pub trait AudioReader: Send {
    /// Decode the first audio stream to mono f32 samples at `target_sample_rate`.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<AudioSegment, AudioDecodeError>;
}
