//! Traits and wire types for the WeChat platform

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A media object created in the material library
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialUpload {
    /// Platform identifier of the uploaded media, never empty
    pub media_id: String,
    /// Platform-hosted URL of the image
    pub url: String,
}

/// One article as the draft endpoint expects it
///
/// Optional fields are omitted from the payload when `None`; the platform treats
/// an absent field differently from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftArticle {
    /// Article title
    pub title: String,

    /// Author name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Summary shown in share cards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// HTML body
    pub content: String,

    /// "Read more" link target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_source_url: Option<String>,

    /// Cover image media id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_media_id: Option<String>,

    /// Whether the cover is shown in the body (0 or 1), only sent with a cover
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_cover_pic: Option<u8>,
}

/// Operations the publishing pipeline needs from the platform
///
/// [`WechatClient`](super::WechatClient) is the real implementation; tests swap in
/// doubles to drive retry and failure paths deterministically.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Upload one image file to the permanent material library
    ///
    /// A single attempt; see [`upload_with_retry`](super::upload_with_retry) for
    /// the retrying variant.
    async fn upload_image(&self, path: &Path) -> Result<MaterialUpload>;

    /// Create a draft from already validated articles and return its media id
    async fn add_draft(&self, articles: &[DraftArticle]) -> Result<String>;
}
