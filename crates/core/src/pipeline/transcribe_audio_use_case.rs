use std::any::Any;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use crate::transcription::domain::asr_engine::{AsrEngine, EngineError};
use crate::transcription::domain::engine_lease::with_engine;
use crate::transcription::domain::inference_options::InferenceOptions;
use crate::transcription::domain::model_tier::ModelTier;
use crate::transcription::domain::quality_scorer::QualityScorer;
use crate::transcription::domain::segment::RawResult;
use crate::transcription::domain::transcription_request::TranscriptionRequest;
use crate::transcription::domain::transcription_result::{ErrorKind, TranscriptionResult};

/// Runs one whole-file transcription request end to end.
///
/// `execute` never fails: validation problems, engine errors and engine
/// panics all come back as [`TranscriptionResult::Failure`]. The engine
/// handle is released before scoring on every path that loaded one.
pub struct TranscribeAudioUseCase {
    engine: Box<dyn AsrEngine>,
}

impl TranscribeAudioUseCase {
    pub fn new(engine: Box<dyn AsrEngine>) -> Self {
        Self { engine }
    }

    /// Caller-facing entry point taking the tier by name.
    ///
    /// The audio path is checked before the tier is parsed, so a missing file
    /// is reported as `InputNotFound` even when the tier is also invalid.
    pub fn transcribe(
        &self,
        audio_path: &Path,
        model_tier: &str,
        language_hint: &str,
    ) -> TranscriptionResult {
        if let Err(message) = validate_audio_path(audio_path) {
            return TranscriptionResult::failure(ErrorKind::InputNotFound, message);
        }
        let tier: ModelTier = match model_tier.parse() {
            Ok(tier) => tier,
            Err(e) => {
                return TranscriptionResult::failure(ErrorKind::EngineLoadFailure, e.to_string())
            }
        };
        let request = TranscriptionRequest::new(audio_path)
            .with_model_tier(tier)
            .with_language(language_hint);
        self.execute(&request)
    }

    pub fn execute(&self, request: &TranscriptionRequest) -> TranscriptionResult {
        // 1. Validate before touching the engine
        if let Err(message) = validate_audio_path(request.audio_path()) {
            log::warn!("{message}");
            return TranscriptionResult::failure(ErrorKind::InputNotFound, message);
        }

        // 2-4. Acquire, infer, release
        let options = InferenceOptions::for_language(&request.language_hint);
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            with_engine(self.engine.as_ref(), request.model_tier, |lease| {
                log::info!("Transcribing {}", display_name(request.audio_path()));
                lease.infer(request.audio_path(), &options)
            })
        }));

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e @ EngineError::Load { .. })) => {
                log::error!("{e}");
                return TranscriptionResult::failure(ErrorKind::EngineLoadFailure, e.to_string());
            }
            Ok(Err(EngineError::Infer(message))) => {
                log::error!("Transcription failed: {message}");
                return TranscriptionResult::failure(ErrorKind::EngineInferFailure, message);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Engine panicked: {message}");
                return TranscriptionResult::failure(ErrorKind::Unknown, message);
            }
        };
        log::debug!(
            "Inference finished in {:.1}s",
            started.elapsed().as_secs_f64()
        );

        // 5. Score and assemble
        assemble(raw, &request.language_hint)
    }
}

fn assemble(raw: RawResult, language_hint: &str) -> TranscriptionResult {
    let normalized = RawResult {
        text: raw.text.trim().to_string(),
        ..raw
    };
    let quality = QualityScorer::score(&normalized);
    log::info!(
        "Transcribed {} segments, quality {:.2} (confidence {:.3}, script ratio {:.3})",
        normalized.segments.len(),
        quality.score,
        quality.confidence,
        quality.script_ratio
    );

    let language = if normalized.detected_language.is_empty() {
        language_hint.to_string()
    } else {
        normalized.detected_language
    };

    TranscriptionResult::success(
        normalized.text,
        language,
        normalized.segments.len(),
        quality,
    )
}

/// The audio path must name an existing, readable regular file.
fn validate_audio_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("audio file not found: {}", path.display()));
    }
    if !path.is_file() {
        return Err(format!("audio path is not a file: {}", path.display()));
    }
    fs::File::open(path)
        .map(|_| ())
        .map_err(|e| format!("audio file not readable: {}: {e}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "engine panicked".to_string()
    }
}
