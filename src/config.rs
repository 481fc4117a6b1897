//! Configuration types for md2wechat
//!
//! Settings are read once from the environment at startup and stay read-only for
//! the lifetime of the process.

use crate::error::{Error, Result};
use std::{path::PathBuf, time::Duration};

/// Default WeChat API base URL
pub const DEFAULT_WECHAT_API_BASE: &str = "https://api.weixin.qq.com";

/// Default OpenAI-compatible image API base URL
pub const DEFAULT_IMAGE_API_BASE: &str = "https://api.openai.com/v1";

/// Number of upload attempts made before giving up
pub const UPLOAD_MAX_ATTEMPTS: u32 = 3;

/// Main configuration for the publishing pipeline
#[derive(Clone, Debug)]
pub struct Config {
    /// WeChat Official Account AppID (required)
    pub wechat_app_id: String,

    /// WeChat API secret (required)
    pub wechat_secret: String,

    /// WeChat API base URL (default: "https://api.weixin.qq.com")
    pub wechat_api_base: String,

    /// Image generation API key, only needed by `generate_image`
    pub image_api_key: Option<String>,

    /// Image generation API base URL (default: "https://api.openai.com/v1")
    pub image_api_base: String,

    /// Image generation model (default: "dall-e-3")
    pub image_model: String,

    /// Requested resolution of generated images (default: "1024x1024")
    pub image_size: String,

    /// Shrink images at or above `max_image_size` before upload (default: true)
    pub compress_images: bool,

    /// Largest allowed image dimension in pixels after conditioning (default: 1920)
    pub max_image_width: u32,

    /// File size in bytes from which an image is conditioned (default: 5 MiB)
    pub max_image_size: u64,

    /// Timeout applied to every single HTTP request (default: 30 seconds, also used for 0)
    pub http_timeout: Duration,

    /// Directory for temporary files (None = system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Upload retry policy
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        let http_timeout = default_http_timeout();
        Self {
            wechat_app_id: String::new(),
            wechat_secret: String::new(),
            wechat_api_base: DEFAULT_WECHAT_API_BASE.to_string(),
            image_api_key: None,
            image_api_base: DEFAULT_IMAGE_API_BASE.to_string(),
            image_model: default_image_model(),
            image_size: default_image_size(),
            compress_images: true,
            max_image_width: default_max_image_width(),
            max_image_size: default_max_image_size(),
            http_timeout,
            temp_dir: None,
            retry: RetryConfig::for_upload(http_timeout),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Fails fast when `WECHAT_APPID` or `WECHAT_SECRET` is missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset. Numeric variables that fail to parse fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        // 0 would make every request time out immediately
        let http_timeout = match env_u64(get("HTTP_TIMEOUT"), 0) {
            0 => default_http_timeout(),
            secs => Duration::from_secs(secs),
        };

        let config = Self {
            wechat_app_id: get("WECHAT_APPID").unwrap_or_default(),
            wechat_secret: get("WECHAT_SECRET").unwrap_or_default(),
            wechat_api_base: trim_base(
                get("WECHAT_API_BASE").unwrap_or_else(|| DEFAULT_WECHAT_API_BASE.to_string()),
            ),
            image_api_key: get("IMAGE_API_KEY"),
            image_api_base: trim_base(
                get("IMAGE_API_BASE").unwrap_or_else(|| DEFAULT_IMAGE_API_BASE.to_string()),
            ),
            image_model: get("IMAGE_MODEL").unwrap_or_else(default_image_model),
            image_size: get("IMAGE_SIZE").unwrap_or_else(default_image_size),
            compress_images: env_bool(get("COMPRESS_IMAGES"), true),
            max_image_width: env_u64(
                get("MAX_IMAGE_WIDTH"),
                u64::from(default_max_image_width()),
            )
            .try_into()
            .unwrap_or(default_max_image_width()),
            max_image_size: env_u64(get("MAX_IMAGE_SIZE"), default_max_image_size()),
            http_timeout,
            temp_dir: get("MD2WECHAT_TEMP_DIR").map(PathBuf::from),
            retry: RetryConfig::for_upload(http_timeout),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the settings every command needs
    pub fn validate(&self) -> Result<()> {
        if self.wechat_app_id.is_empty() {
            return Err(Error::config("WECHAT_APPID is required", "WECHAT_APPID"));
        }
        if self.wechat_secret.is_empty() {
            return Err(Error::config("WECHAT_SECRET is required", "WECHAT_SECRET"));
        }
        Ok(())
    }

    /// Check the settings needed by image generation
    ///
    /// Generation is optional, so this runs right before use rather than at load time.
    pub fn validate_for_image_generation(&self) -> Result<&str> {
        match self.image_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::config(
                "IMAGE_API_KEY is required for image generation",
                "IMAGE_API_KEY",
            )),
        }
    }
}

/// Retry behavior for material uploads
///
/// `max_attempts` counts every attempt including the first one.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts (default: 3)
    pub max_attempts: u32,

    /// Delay before the first retry (default: 1 second)
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: the HTTP timeout)
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    pub jitter: bool,
}

impl RetryConfig {
    /// Upload policy whose delays never exceed the per-request timeout
    pub fn for_upload(http_timeout: Duration) -> Self {
        Self {
            max_delay: http_timeout,
            ..Self::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: UPLOAD_MAX_ATTEMPTS,
            initial_delay: Duration::from_secs(1),
            max_delay: default_http_timeout(),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_max_image_width() -> u32 {
    1920
}

fn default_max_image_size() -> u64 {
    5 * 1024 * 1024
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

// "true" and "1" enable; any other non-empty value disables
fn env_bool(value: Option<String>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => v == "true" || v == "1",
    }
}

fn env_u64(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}
