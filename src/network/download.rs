// file: src/network/download.rs
// version: 1.0.0
// guid: c7e92b40-8f15-4da3-b671-05a84c3d9e26

//! Network download utilities

use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Downloader for release assets and toolchain tarballs
pub struct NetworkDownloader {
    client: reqwest::Client,
}

impl NetworkDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Download a large file with a progress bar
    pub async fn download_with_progress<P: AsRef<Path>>(&self, url: &str, dest: P) -> Result<()> {
        info!("Downloading: {}", url);

        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(crate::error::ProvisionError::network(format!(
                "download failed with status {}",
                response.status()
            )));
        }

        let total_size = response.content_length().unwrap_or(0);
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut file = File::create(&dest).await?;
        let mut downloaded = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        file.flush().await?;
        pb.finish_with_message("Download completed");

        info!("Downloaded to: {}", dest.as_ref().display());
        Ok(())
    }

    /// Download a small file without progress reporting
    pub async fn download<P: AsRef<Path>>(&self, url: &str, dest: P) -> Result<()> {
        debug!("Downloading (no progress): {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(crate::error::ProvisionError::network(format!(
                "download failed with status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(&dest, bytes).await?;

        debug!("Downloaded to: {}", dest.as_ref().display());
        Ok(())
    }
}

impl Default for NetworkDownloader {
    fn default() -> Self {
        Self::new()
    }
}
