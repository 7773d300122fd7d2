mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use speechcheck_core::pipeline::transcribe_audio_use_case::TranscribeAudioUseCase;
use speechcheck_core::transcription::domain::model_tier::ModelTier;
use speechcheck_core::transcription::domain::transcription_request::TranscriptionRequest;
use speechcheck_core::transcription::domain::transcription_result::TranscriptionResult;
use speechcheck_core::transcription::infrastructure::whisper_engine::WhisperEngine;

use settings::Settings;

/// Transcribe an audio file with Whisper and report a quality score.
#[derive(Parser)]
#[command(name = "speechcheck")]
struct Cli {
    /// Audio file to transcribe.
    audio_path: PathBuf,

    /// Whisper model size: tiny, base, small, medium, large.
    #[arg(long)]
    model: Option<ModelTier>,

    /// Language code passed to the engine (zh, en, ...).
    #[arg(long)]
    language: Option<String>,

    /// Print the full result as JSON instead of plain text.
    #[arg(long)]
    output_json: bool,

    /// Directory searched for ggml model files before the user cache.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Inference threads (default: available cores, at most 4).
    #[arg(long)]
    threads: Option<usize>,

    /// Store the effective model, language, model dir and threads as defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load();
    validate(&cli)?;

    let effective = merge(&cli, settings);
    if cli.save_settings {
        let path = effective.save()?;
        log::info!("Saved settings to {}", path.display());
    }
    let tier = effective.model;
    let language = effective.language;

    let mut engine = WhisperEngine::new().with_download_progress(Arc::new(download_progress));
    if let Some(dir) = effective.model_dir {
        engine = engine.with_model_dir(dir);
    }
    if let Some(n) = effective.threads {
        engine = engine.with_threads(n);
    }

    let use_case = TranscribeAudioUseCase::new(Box::new(engine));
    let request = TranscriptionRequest::new(&cli.audio_path)
        .with_model_tier(tier)
        .with_language(&language);
    let result = use_case.execute(&request);

    if cli.output_json {
        println!("{}", result.to_json()?);
        return Ok(0);
    }
    Ok(print_plain(&result))
}

/// Command-line flags win over stored settings.
fn merge(cli: &Cli, settings: Settings) -> Settings {
    Settings {
        model: cli.model.unwrap_or(settings.model),
        language: cli.language.clone().unwrap_or(settings.language),
        model_dir: cli.model_dir.clone().or(settings.model_dir),
        threads: cli.threads.or(settings.threads),
    }
}

/// Plain mode: text on stdout, or the error on stderr with a non-zero status.
fn print_plain(result: &TranscriptionResult) -> i32 {
    match result {
        TranscriptionResult::Success(s) => {
            println!("{}", s.text);
            0
        }
        TranscriptionResult::Failure(f) => {
            eprintln!("Transcription failed: {}", f.message);
            1
        }
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(lang) = &cli.language {
        if lang.trim().is_empty() {
            return Err("Language must not be empty".into());
        }
    }
    if cli.threads == Some(0) {
        return Err("Threads must be at least 1".into());
    }
    if let Some(dir) = &cli.model_dir {
        if !dir.is_dir() {
            return Err(format!("Model directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading Whisper model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading Whisper model... {downloaded} bytes");
    }
}
