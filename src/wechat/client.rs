//! HTTP implementation of [`PlatformApi`] against the WeChat Official Account API

use super::traits::{DraftArticle, MaterialUpload, PlatformApi};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::{image_mime_type, redact_query, upload_file_name};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Errcodes meaning the access token is invalid or expired
pub const STALE_TOKEN_ERRCODES: &[i64] = &[40001, 40014, 42001];

/// Tokens are refreshed this long before the platform says they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Upper bound on how long a token is trusted, whatever `expires_in` says
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// How long a token with the given `expires_in` may be reused
///
/// The margin shrinks to a fifth of the lifetime for short-lived tokens so they are
/// still cached.
fn reuse_window(expires_in: u64) -> Duration {
    let lifetime = Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME);
    lifetime.saturating_sub(TOKEN_REFRESH_MARGIN.min(lifetime / 5))
}

/// WeChat Official Account API client
///
/// Holds the access token for the life of the process and refreshes it when it
/// nears expiry or the platform rejects it.
#[derive(Debug)]
pub struct WechatClient {
    http: reqwest::Client,
    api_base: String,
    app_id: String,
    secret: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    7200
}

#[derive(Deserialize)]
struct AddMaterialResponse {
    #[serde(default)]
    media_id: String,
    #[serde(default)]
    url: String,
}

#[derive(Serialize)]
struct AddDraftRequest<'a> {
    articles: &'a [DraftArticle],
}

#[derive(Deserialize)]
struct AddDraftResponse {
    #[serde(default)]
    media_id: String,
}

impl WechatClient {
    /// Create a client from the credentials and base URL in `config`
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_base: config.wechat_api_base.trim_end_matches('/').to_string(),
            app_id: config.wechat_app_id.clone(),
            secret: config.wechat_secret.clone(),
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one if needed
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.refresh_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        let url = format!("{}/cgi-bin/token", self.api_base);
        tracing::debug!(url = %url, "requesting access token");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.app_id.as_str()),
                ("secret", self.secret.as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = parse_response(response).await?;
        if token.access_token.is_empty() {
            return Err(Error::InvalidResponse("empty access_token".to_string()));
        }

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + reuse_window(token.expires_in),
        });
        Ok(token.access_token)
    }

    /// Forget the cached access token
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn drop_stale_token<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(Error::Platform { errcode, .. }) = &result
            && STALE_TOKEN_ERRCODES.contains(errcode)
        {
            tracing::warn!(errcode, "access token rejected, will refresh");
            self.invalidate_token().await;
        }
        result
    }
}

#[async_trait]
impl PlatformApi for WechatClient {
    async fn upload_image(&self, path: &Path) -> Result<MaterialUpload> {
        let data = tokio::fs::read(path).await?;
        let size = data.len();
        let token = self.access_token().await?;

        let part = Part::bytes(data)
            .file_name(upload_file_name(path))
            .mime_str(image_mime_type(path))?;
        let form = Form::new().part("media", part);

        let url = format!("{}/cgi-bin/material/add_material", self.api_base);
        tracing::debug!(path = %path.display(), size, "uploading material");
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", token.as_str()), ("type", "image")])
            .multipart(form)
            .send()
            .await?;

        let upload: AddMaterialResponse = self
            .drop_stale_token(parse_response(response).await)
            .await?;
        if upload.media_id.is_empty() {
            return Err(Error::InvalidResponse(
                "add_material returned an empty media_id".to_string(),
            ));
        }

        tracing::info!(media_id = %upload.media_id, "material uploaded");
        Ok(MaterialUpload {
            media_id: upload.media_id,
            url: upload.url,
        })
    }

    async fn add_draft(&self, articles: &[DraftArticle]) -> Result<String> {
        let token = self.access_token().await?;
        let url = format!("{}/cgi-bin/draft/add", self.api_base);

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", token.as_str())])
            .json(&AddDraftRequest { articles })
            .send()
            .await?;

        let draft: AddDraftResponse = self
            .drop_stale_token(parse_response(response).await)
            .await?;
        if draft.media_id.is_empty() {
            return Err(Error::InvalidResponse(
                "draft/add returned an empty media_id".to_string(),
            ));
        }

        tracing::info!(media_id = %draft.media_id, articles = articles.len(), "draft created");
        Ok(draft.media_id)
    }
}

/// Decode a platform response, mapping HTTP failures and non-zero `errcode`s
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let url = redact_query(response.url().as_str());
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            url,
            body,
        });
    }

    let value: serde_json::Value = serde_json::from_str(&body)?;
    let errcode = value.get("errcode").and_then(|c| c.as_i64()).unwrap_or(0);
    if errcode != 0 {
        let errmsg = value
            .get("errmsg")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(Error::Platform { errcode, errmsg });
    }

    Ok(serde_json::from_value(value)?)
}
