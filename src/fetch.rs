//! Remote image fetching
//!
//! Downloads a URL into a scoped temporary file. There is no retry here: a failed
//! download is reported straight away so the origin of an asset stays clear.

use crate::error::{Error, Result};
use crate::utils::{extension_from_response, redact_query};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempPath;

/// Prefix of every temporary file this crate creates
pub const TEMP_FILE_PREFIX: &str = "md2wechat-";

/// Downloads remote files to temporary storage
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
    temp_dir: Option<PathBuf>,
}

impl Fetcher {
    /// Create a fetcher using `http` and writing into `temp_dir` (system temp dir if None)
    pub fn new(http: reqwest::Client, temp_dir: Option<PathBuf>) -> Self {
        Self { http, temp_dir }
    }

    /// Download `url` into a new temporary file
    ///
    /// The returned [`TempPath`] deletes the file when dropped, so the caller owns
    /// the download for exactly as long as it keeps the guard.
    pub async fn download(&self, url: &str) -> Result<TempPath> {
        tracing::info!(url = %redact_query(url), "downloading image");

        let mut response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                url: redact_query(url),
                body,
            });
        }

        let extension = extension_from_response(&response, url);
        let mut file = new_temp_file(self.temp_dir.as_deref(), &extension)?;

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        file.flush()?;

        let path = file.into_temp_path();
        tracing::debug!(path = %path.display(), bytes = written, "download complete");
        Ok(path)
    }
}

/// Create an empty named temporary file with the given extension
pub(crate) fn new_temp_file(
    dir: Option<&std::path::Path>,
    extension: &str,
) -> Result<tempfile::NamedTempFile> {
    let suffix = format!(".{extension}");
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_FILE_PREFIX).suffix(&suffix);

    let file = match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            builder.tempfile_in(dir)?
        }
        None => builder.tempfile()?,
    };
    Ok(file)
}
