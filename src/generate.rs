//! Client for OpenAI-compatible image generation APIs

use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Calls `{image_api_base}/images/generations` and returns the image URL
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    size: String,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}

impl ImageGenerator {
    /// Create a generator, failing if no image API key is configured
    pub fn new(http: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config.validate_for_image_generation()?.to_string();
        Ok(Self {
            http,
            endpoint: format!(
                "{}/images/generations",
                config.image_api_base.trim_end_matches('/')
            ),
            api_key,
            model: config.image_model.clone(),
            size: config.image_size.clone(),
        })
    }

    /// Generate one image for `prompt` and return its source URL
    ///
    /// The image is not downloaded here.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::info!(model = %self.model, size = %self.size, "requesting image generation");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&GenerationRequest {
                model: &self.model,
                prompt,
                n: 1,
                size: &self.size,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Generation(format!(
                "API error (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: GenerationResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Generation(format!("failed to parse response: {e}")))?;

        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Generation("no image generated".to_string()))?;

        tracing::info!(url = %url, "image generated");
        Ok(url)
    }
}
