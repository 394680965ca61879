use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;

use super::CaptureRequest;

/// Destination for captured IQ bytes.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Persist `data` and return an identifier (usually a path) for it.
    async fn store(&self, request: &CaptureRequest, captured_at: DateTime<Utc>, data: Vec<u8>) -> Result<String>;
}

/// Writes each capture to its own `.bin` file.
pub struct FileCaptureStore {
    directory: PathBuf,
}

impl FileCaptureStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn file_name(request: &CaptureRequest, captured_at: DateTime<Utc>) -> String {
        format!(
            "iq_{:.2}MHz_{}.bin",
            request.frequency_mhz(),
            captured_at.format("%Y%m%d_%H%M%S")
        )
    }
}

#[async_trait]
impl CaptureStore for FileCaptureStore {
    async fn store(&self, request: &CaptureRequest, captured_at: DateTime<Utc>, data: Vec<u8>) -> Result<String> {
        fs::create_dir_all(&self.directory)
            .await
            .context("Failed to create capture directory")?;

        let path = self.directory.join(Self::file_name(request, captured_at));
        fs::write(&path, data)
            .await
            .context(format!("Failed to write capture to {:?}", path))?;

        Ok(path.to_string_lossy().into_owned())
    }
}
