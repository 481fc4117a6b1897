//! WeChat Official Account platform client
//!
//! - [`PlatformApi`] is the seam the pipeline and draft service talk to
//! - [`WechatClient`] implements it over HTTP (access token, material upload, draft)
//! - [`upload_with_retry`] layers the retry policy over a single upload attempt

mod client;
mod traits;
mod upload;

pub use client::{STALE_TOKEN_ERRCODES, WechatClient};
pub use traits::{DraftArticle, MaterialUpload, PlatformApi};
pub use upload::upload_with_retry;
