use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;
use crate::transcription::domain::model_tier::ModelTier;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed for {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("download interrupted for {url}: {source}")]
    Stream {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Locate the ggml weights for `tier`, downloading them if needed.
///
/// Resolution order:
/// 1. `model_dir`, when the caller configured one
/// 2. User cache directory (platform-specific)
/// 3. Download from the model host into the cache
pub fn resolve(
    tier: ModelTier,
    model_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let name = tier.model_file_name();

    if let Some(path) = model_dir.and_then(|dir| existing(dir, name)) {
        log::debug!("Using configured model {}", path.display());
        return Ok(path);
    }

    let cache_dir = model_cache_dir()?;
    if let Some(path) = existing(&cache_dir, name) {
        log::debug!("Using cached model {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    let dest = cache_dir.join(name);
    let url = tier.model_url();
    log::info!("Downloading {tier} model from {url}");
    download(&url, &dest, progress)?;
    Ok(dest)
}

fn existing(dir: &Path, name: &str) -> Option<PathBuf> {
    let path = dir.join(name);
    path.is_file().then_some(path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/speechcheck/models/`
/// - Linux: `$XDG_CACHE_HOME/speechcheck/models/` or `~/.cache/speechcheck/models/`
/// - Windows: `%LOCALAPPDATA%/speechcheck/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url).map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;

    if !response.status().is_success() {
        return Err(ModelResolveError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length().unwrap_or(0);

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;

    let streamed = stream_to_file(
        &mut response,
        &mut file,
        total,
        progress.as_ref(),
        url,
        &temp_path,
    );
    drop(file);
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Copy the response body to disk as it arrives, reporting progress per chunk.
fn stream_to_file(
    reader: &mut dyn Read,
    file: &mut fs::File,
    total: u64,
    progress: Option<&ProgressFn>,
    url: &str,
    temp_path: &Path,
) -> Result<(), ModelResolveError> {
    let write_err = |source| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ModelResolveError::Stream {
                    url: url.to_string(),
                    source: e,
                })
            }
        };
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)
}
