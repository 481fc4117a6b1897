//! Utility functions for HTTP clients and image file naming

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;

/// Image extensions the WeChat material library accepts
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Extension used when nothing better is known
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Build the shared HTTP client
///
/// The timeout applies to each request individually, so every retry attempt gets
/// the full budget.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("md2wechat/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Other(format!("failed to create HTTP client: {e}")))
}

/// Lower-cased extension of `path`, if it is a supported image extension
pub fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// MIME type for an image path, derived from its extension
///
/// Unknown extensions are reported as JPEG.
pub fn image_mime_type(path: &Path) -> &'static str {
    match image_extension(path).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// File name to present in a multipart upload
///
/// The platform decides the media type from the name, so a name without a
/// supported extension gets the default one appended.
pub fn upload_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("image");

    if image_extension(path).is_some() {
        name.to_string()
    } else {
        format!("{name}.{DEFAULT_IMAGE_EXTENSION}")
    }
}

/// Map an image `Content-Type` to a file extension
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/bmp" | "image/x-ms-bmp" => Some("bmp"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Pick the extension for a downloaded image
///
/// Tries the `Content-Type` header first, then the last URL path segment, and
/// falls back to [`DEFAULT_IMAGE_EXTENSION`].
pub fn extension_from_response(response: &reqwest::Response, url: &str) -> String {
    if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE)
        && let Ok(value) = content_type.to_str()
        && let Some(ext) = extension_from_content_type(value)
    {
        return ext.to_string();
    }

    extension_from_url(url).unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}

/// Supported image extension of the last path segment of `url`
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last_segment).ok()?;
    image_extension(Path::new(decoded.as_ref()))
}

/// Strip the query string from a URL before it is logged or reported
///
/// WeChat endpoints carry the access token as a query parameter.
pub fn redact_query(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}
