//! Browser-side face-api.js build and model weights.
//!
//! The files are fetched once into the public directory and then served from
//! disk. Only the names listed here are ever served.

use std::path::{Path, PathBuf};
use std::time::Duration;

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, mime, web};
use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const FACEAPI_FILE: &str = "faceapi.js";
pub const MODELS_DIR: &str = "models";

pub const MODEL_FILES: [&str; 8] = [
    "ssd_mobilenetv1_model-weights_manifest.json",
    "ssd_mobilenetv1_model-shard1",
    "ssd_mobilenetv1_model-shard2",
    "face_landmark_68_model-weights_manifest.json",
    "face_landmark_68_model-shard1",
    "face_recognition_model-weights_manifest.json",
    "face_recognition_model-shard1",
    "face_recognition_model-shard2",
];

/// Outcome of [`ensure_assets`], one entry per file.
#[derive(Debug, Default)]
pub struct AssetReport {
    pub cached: usize,
    pub downloaded: usize,
    pub failed: Vec<String>,
}

impl AssetReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

fn model_url(base: &str, file: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

async fn write_part(part: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(part)
        .await
        .with_context(|| format!("failed to create {}", part.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("failed to write {}", part.display()))?;
    file.sync_all().await.context("failed to sync asset file")?;
    Ok(())
}

/// Fetch `url` into `dest` through a `.part` file so a failed transfer never
/// leaves a truncated asset behind. Redirects are followed by the client.
async fn download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<usize> {
    let bytes = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} returned an error status"))?
        .bytes()
        .await
        .with_context(|| format!("failed to read body of {url}"))?;

    let part = part_path(dest);
    if let Err(e) = write_part(&part, &bytes).await {
        let _ = fs::remove_file(&part).await;
        return Err(e);
    }
    fs::rename(&part, dest)
        .await
        .with_context(|| format!("failed to move {} into place", dest.display()))?;

    Ok(bytes.len())
}

async fn fetch_if_missing(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    report: &mut AssetReport,
) {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if fs::try_exists(dest).await.unwrap_or(false) {
        info!(file = %name, "Asset cached");
        report.cached += 1;
        return;
    }

    match download(client, url, dest).await {
        Ok(size) => {
            info!(file = %name, bytes = size, "Asset downloaded");
            report.downloaded += 1;
        }
        Err(e) => {
            warn!(file = %name, error = %format!("{e:#}"), "Asset download failed");
            report.failed.push(name);
        }
    }
}

/// Create the public directories and fetch any missing asset.
///
/// Download failures are logged and reported but never abort startup; the
/// browser shows a "not ready" state until the files exist.
pub async fn ensure_assets(config: &Config) -> Result<AssetReport> {
    let models_dir = config.public_dir.join(MODELS_DIR);
    fs::create_dir_all(&models_dir)
        .await
        .with_context(|| format!("failed to create {}", models_dir.display()))?;

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build download client")?;

    let mut report = AssetReport::default();

    fetch_if_missing(
        &client,
        &config.faceapi_url,
        &config.public_dir.join(FACEAPI_FILE),
        &mut report,
    )
    .await;

    for file in MODEL_FILES {
        let url = model_url(&config.model_base_url, file);
        fetch_if_missing(&client, &url, &models_dir.join(file), &mut report).await;
    }

    info!(
        cached = report.cached,
        downloaded = report.downloaded,
        failed = report.failed.len(),
        "Asset setup finished"
    );
    Ok(report)
}

async fn serve_file(path: PathBuf, content_type: ContentType) -> AppResult<HttpResponse> {
    match fs::read(&path).await {
        Ok(bytes) => Ok(HttpResponse::Ok().insert_header(content_type).body(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("Asset not downloaded yet".into()))
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to read asset");
            Err(AppError::Internal(e.to_string()))
        }
    }
}

pub async fn faceapi_js(config: web::Data<Config>) -> AppResult<HttpResponse> {
    let path = config.public_dir.join(FACEAPI_FILE);
    serve_file(path, ContentType(mime_for(FACEAPI_FILE))).await
}

pub async fn model_file(
    config: web::Data<Config>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let file = path.into_inner();
    let Some(known) = MODEL_FILES.iter().find(|f| **f == file) else {
        return Err(AppError::NotFound("Unknown model file".into()));
    };

    let path = config.public_dir.join(MODELS_DIR).join(known);
    serve_file(path, ContentType(mime_for(known))).await
}

fn mime_for(file: &str) -> mime::Mime {
    if file.ends_with(".js") {
        mime::APPLICATION_JAVASCRIPT
    } else if file.ends_with(".json") {
        mime::APPLICATION_JSON
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}
