//! Pipeline orchestration: acquire an image, condition it, upload it
//!
//! Every entry point funnels into the same condition-then-upload step. Temporary
//! files (downloads and conditioned replacements) are guards held by the running
//! operation, so they are removed on success and on every error path alike.

use crate::condition::{Conditioned, Conditioner, probe_dimensions};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::generate::ImageGenerator;
use crate::types::{GenerateAndUploadResult, UploadResult};
use crate::utils::build_http_client;
use crate::wechat::{PlatformApi, WechatClient, upload_with_retry};
use std::path::Path;
use std::sync::Arc;

/// Runs the image publishing operations
pub struct Processor {
    config: Config,
    http: reqwest::Client,
    platform: Arc<dyn PlatformApi>,
    fetcher: Fetcher,
    conditioner: Conditioner,
}

impl Processor {
    /// Create a processor talking to the real WeChat API
    pub fn new(config: Config) -> Result<Self> {
        let http = build_http_client(config.http_timeout)?;
        let platform = Arc::new(WechatClient::new(http.clone(), &config));
        Ok(Self::with_platform(config, http, platform))
    }

    /// Create a processor uploading through `platform`
    pub fn with_platform(
        config: Config,
        http: reqwest::Client,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        let fetcher = Fetcher::new(http.clone(), config.temp_dir.clone());
        let conditioner = Conditioner::new(&config);
        Self {
            config,
            http,
            platform,
            fetcher,
            conditioner,
        }
    }

    /// The platform this processor uploads to, for sharing its token cache
    pub fn platform(&self) -> Arc<dyn PlatformApi> {
        Arc::clone(&self.platform)
    }

    /// Upload a local image file
    pub async fn upload_local(&self, path: &Path) -> Result<UploadResult> {
        tracing::info!(path = %path.display(), "uploading local image");

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(Error::FileNotFound(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        self.condition_and_upload(path).await
    }

    /// Download an image from `url` and upload it
    pub async fn download_and_upload(&self, url: &str) -> Result<UploadResult> {
        let downloaded = self.fetcher.download(url).await?;
        self.condition_and_upload(&downloaded).await
    }

    /// Generate an image from `prompt`, then download and upload it
    pub async fn generate_and_upload(&self, prompt: &str) -> Result<GenerateAndUploadResult> {
        let generator = ImageGenerator::new(self.http.clone(), &self.config)?;

        let original_url = generator.generate(prompt).await?;
        let upload = self.download_and_upload(&original_url).await?;

        Ok(GenerateAndUploadResult {
            prompt: prompt.to_string(),
            original_url,
            upload,
        })
    }

    async fn condition_and_upload(&self, path: &Path) -> Result<UploadResult> {
        let conditioned = match self.conditioner.condition_if_needed(path).await {
            Ok(conditioned) => conditioned,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    code = e.code(),
                    "image compression failed, uploading original"
                );
                Conditioned::Unchanged
            }
        };

        let upload_path = conditioned.path_or(path);
        let upload =
            upload_with_retry(self.platform.as_ref(), upload_path, &self.config.retry).await?;

        let (width, height) = match conditioned.dimensions() {
            Some(dimensions) => dimensions,
            None => {
                let probe_path = upload_path.to_path_buf();
                tokio::task::spawn_blocking(move || probe_dimensions(&probe_path))
                    .await
                    .unwrap_or((0, 0))
            }
        };

        Ok(UploadResult {
            media_id: upload.media_id,
            wechat_url: upload.url,
            width,
            height,
        })
    }
}
