//! Download of model files from the Hugging Face hub.
//!
//! Files land in `<cache_dir>/embedport/models/<owner>--<name>/<revision>/`
//! and are reused on later runs. A `.downloading` marker is written before the first
//! byte and removed after the last one, so an interrupted download is
//! detected and discarded on the next attempt.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
const DEFAULT_REVISION: &str = "main";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const MARKER_FILE: &str = ".downloading";

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub endpoint: String,
    pub revision: String,
    pub cache_dir: PathBuf,
    pub timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            cache_dir: default_cache_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HubConfig {
    /// Honors `HF_ENDPOINT`, `EMBEDPORT_REVISION` and `EMBEDPORT_CACHE_DIR`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let endpoint = std::env::var("HF_ENDPOINT")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.endpoint);

        let revision = std::env::var("EMBEDPORT_REVISION")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.revision);

        let cache_dir = std::env::var_os("EMBEDPORT_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        Self {
            endpoint,
            revision,
            cache_dir,
            timeout: defaults.timeout,
        }
    }

    /// Local directory holding the files of `repo` at the configured revision.
    pub fn model_dir(&self, repo: &str) -> PathBuf {
        self.cache_dir
            .join(repo.replace('/', "--"))
            .join(self.revision.replace('/', "--"))
    }

    fn file_url(&self, repo: &str, filename: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, repo, self.revision, filename
        )
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("embedport")
        .join("models")
}

/// Ensure `required` files of `repo` are cached locally, fetching what is
/// missing. `optional` files are fetched when the hub has them and skipped
/// otherwise. Returns the local model directory.
pub fn ensure_model_downloaded(
    config: &HubConfig,
    repo: &str,
    required: &[&str],
    optional: &[&str],
) -> Result<PathBuf> {
    let model_dir = config.model_dir(repo);
    let marker = model_dir.join(MARKER_FILE);

    if marker.exists() {
        warn!("Found partial download of {}, cleaning up...", repo);
        fs::remove_dir_all(&model_dir)
            .with_context(|| format!("Failed to clean up {}", model_dir.display()))?;
    }

    if has_files(&model_dir, required) {
        debug!("{} already available at {}", repo, model_dir.display());
        return Ok(model_dir);
    }

    fs::create_dir_all(&model_dir)
        .with_context(|| format!("Failed to create {}", model_dir.display()))?;
    fs::write(&marker, "").context("Failed to write download marker")?;

    info!("Downloading {} to {}...", repo, model_dir.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .build()
        .context("Failed to build HTTP client")?;

    for filename in required {
        if !fetch(&client, config, repo, filename, &model_dir)? {
            bail!("{} has no file '{}' at revision {}", repo, filename, config.revision);
        }
    }

    for filename in optional {
        if !fetch(&client, config, repo, filename, &model_dir)? {
            debug!("  {} not published, skipping", filename);
        }
    }

    let _ = fs::remove_file(&marker);

    info!("Download of {} complete", repo);
    Ok(model_dir)
}

/// Returns `Ok(false)` when the hub answers 404.
fn fetch(
    client: &reqwest::blocking::Client,
    config: &HubConfig,
    repo: &str,
    filename: &str,
    model_dir: &Path,
) -> Result<bool> {
    let dest = model_dir.join(filename);
    if dest.exists() {
        return Ok(true);
    }

    let url = config.file_url(repo, filename);
    info!("  Downloading {}...", filename);

    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("Failed to download {}", url))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !response.status().is_success() {
        bail!("Download of {} failed with status {}", url, response.status());
    }

    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read {}", filename))?;

    let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
    info!("  {}: {:.1} MB", filename, size_mb);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    Ok(true)
}

fn has_files(dir: &Path, files: &[&str]) -> bool {
    files.iter().all(|f| dir.join(f).exists())
}
