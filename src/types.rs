//! Result types and the command output envelope

use serde::{Deserialize, Serialize};

/// An image stored in the material library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Platform media id, never empty
    pub media_id: String,
    /// Platform-hosted image URL
    pub wechat_url: String,
    /// Width in pixels of the uploaded file (0 if unknown)
    pub width: u32,
    /// Height in pixels of the uploaded file (0 if unknown)
    pub height: u32,
}

/// An AI-generated image stored in the material library, with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAndUploadResult {
    /// Prompt the image was generated from
    pub prompt: String,
    /// URL the generator returned, before download
    pub original_url: String,
    /// The upload itself
    #[serde(flatten)]
    pub upload: UploadResult,
}

/// A draft created on the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResult {
    /// Platform media id of the draft
    pub media_id: String,
    /// Link to the draft, when the platform provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_url: Option<String>,
}

/// The single JSON object a command prints on stdout
#[derive(Debug, Serialize)]
pub struct Response<T: Serialize> {
    /// Whether the command succeeded
    pub success: bool,
    /// Result payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Response<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl Response<()> {
    /// Failed response carrying the error message
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Write `value` as indented JSON followed by a newline
///
/// `serde_json` never HTML-escapes, so markup in article content is printed as is.
pub fn write_json<W: std::io::Write, T: Serialize>(
    mut writer: W,
    value: &T,
) -> std::result::Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)
}
