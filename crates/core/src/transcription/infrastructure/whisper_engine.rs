use std::path::{Path, PathBuf};
use std::sync::Arc;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use crate::shared::constants::{MAX_DEFAULT_THREADS, WHISPER_SAMPLE_RATE};
use crate::transcription::domain::asr_engine::{AsrEngine, EngineError, EngineHandle};
use crate::transcription::domain::inference_options::InferenceOptions;
use crate::transcription::domain::model_tier::ModelTier;
use crate::transcription::domain::segment::{RawResult, Segment};
use crate::transcription::infrastructure::model_resolver;

pub type DownloadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// ASR engine backed by whisper.cpp via whisper-rs.
///
/// Contexts are created with GPU offload disabled, so every inference runs on
/// the CPU at full precision.
pub struct WhisperEngine {
    model_dir: Option<PathBuf>,
    n_threads: usize,
    download_progress: Option<DownloadProgress>,
}

impl WhisperEngine {
    pub fn new() -> Self {
        Self {
            model_dir: None,
            n_threads: num_cpus().min(MAX_DEFAULT_THREADS),
            download_progress: None,
        }
    }

    /// Look for model files in `dir` before the user cache.
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads.max(1);
        self
    }

    pub fn with_download_progress(mut self, progress: DownloadProgress) -> Self {
        self.download_progress = Some(progress);
        self
    }

    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    fn resolve_model(&self, tier: ModelTier) -> Result<PathBuf, EngineError> {
        let progress = self.download_progress.clone().map(|cb| -> model_resolver::ProgressFn {
            Box::new(move |downloaded, total| cb(downloaded, total))
        });
        model_resolver::resolve(tier, self.model_dir.as_deref(), progress).map_err(|e| {
            EngineError::Load {
                tier,
                message: e.to_string(),
            }
        })
    }
}

impl Default for WhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AsrEngine for WhisperEngine {
    fn load_engine(&self, tier: ModelTier) -> Result<Box<dyn EngineHandle>, EngineError> {
        let model_path = self.resolve_model(tier)?;
        let model_str = model_path.to_str().ok_or_else(|| EngineError::Load {
            tier,
            message: format!("model path is not valid UTF-8: {}", model_path.display()),
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(false);

        let ctx = WhisperContext::new_with_params(model_str, ctx_params).map_err(|e| {
            EngineError::Load {
                tier,
                message: e.to_string(),
            }
        })?;
        log::debug!("Loaded {}", model_path.display());

        Ok(Box::new(WhisperHandle {
            ctx: Some(ctx),
            reader: Box::new(FfmpegAudioReader),
            n_threads: self.n_threads,
        }))
    }
}

/// A loaded whisper context. Dropping the context frees the model weights.
pub struct WhisperHandle {
    ctx: Option<WhisperContext>,
    reader: Box<dyn AudioReader>,
    n_threads: usize,
}

impl EngineHandle for WhisperHandle {
    fn infer(
        &mut self,
        audio_path: &Path,
        options: &InferenceOptions,
    ) -> Result<RawResult, EngineError> {
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| EngineError::Infer("engine handle already released".to_string()))?;

        let audio = self
            .reader
            .read_audio(audio_path, WHISPER_SAMPLE_RATE)
            .map_err(|e| EngineError::Infer(e.to_string()))?;
        if audio.is_empty() {
            return Err(EngineError::Infer(format!(
                "no audio samples decoded from {}",
                audio_path.display()
            )));
        }
        log::debug!("Decoded {:.1}s of audio", audio.duration());

        let mut state = ctx
            .create_state()
            .map_err(|e| EngineError::Infer(format!("failed to create Whisper state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(options.language.as_str()));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(options.verbose);
        params.set_print_realtime(false);
        params.set_print_timestamps(options.verbose);
        params.set_n_threads(self.n_threads as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| EngineError::Infer(format!("Whisper inference failed: {e}")))?;

        let mut text = String::new();
        let mut segments = Vec::new();
        for seg_idx in 0..state.full_n_segments() {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };
            let seg_text = match segment.to_str() {
                Ok(t) => t.to_string(),
                Err(e) => {
                    log::warn!("Skipping undecodable segment {seg_idx}: {e}");
                    continue;
                }
            };
            text.push_str(&seg_text);
            // Segment timestamps are in centiseconds
            segments.push(Segment {
                start_offset: segment.start_timestamp() as f64 / 100.0,
                end_offset: segment.end_timestamp() as f64 / 100.0,
                text: seg_text.trim().to_string(),
                no_speech_probability: Some(segment.no_speech_probability() as f64),
            });
        }

        let detected_language = whisper_rs::get_lang_str(state.full_lang_id_from_state())
            .map(str::to_string)
            .unwrap_or_default();

        Ok(RawResult {
            text,
            detected_language,
            segments,
        })
    }

    fn release(&mut self) {
        self.ctx.take();
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
