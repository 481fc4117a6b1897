//! # md2wechat
//!
//! Image acquisition and publishing pipeline for WeChat Official Accounts.
//!
//! ## What it does
//!
//! - Uploads local images, remote images and AI-generated images to the
//!   permanent material library, shrinking oversized files first
//! - Retries transient upload failures with exponential backoff
//! - Creates multi-article drafts that reference uploaded media
//!
//! Temporary files created along the way are owned by the operation that created
//! them and are removed on every exit path.
//!
//! ## Quick Start
//!
//! ```no_run
//! use md2wechat::{Config, Processor};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let processor = Processor::new(config)?;
//!
//!     let uploaded = processor.upload_local(Path::new("cover.jpg")).await?;
//!     println!("media id: {}", uploaded.media_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Command line parsing and dispatch
pub mod cli;
/// Size-driven image shrinking
pub mod condition;
/// Configuration types
pub mod config;
/// Draft creation
pub mod draft;
/// Error types
pub mod error;
/// Remote image download
pub mod fetch;
/// AI image generation client
pub mod generate;
/// Upload pipeline orchestration
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Result types and output envelope
pub mod types;
/// Utility functions
pub mod utils;
/// WeChat platform client
pub mod wechat;

// Re-export commonly used types
pub use config::{Config, RetryConfig};
pub use draft::{Article, DraftRequest, DraftService};
pub use error::{Error, Result};
pub use pipeline::Processor;
pub use types::{DraftResult, GenerateAndUploadResult, Response, UploadResult};
pub use wechat::{PlatformApi, WechatClient};
