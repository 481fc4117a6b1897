//! Command line surface of the `md2wechat` binary
//!
//! Each command takes its argument as the first of a free-form value list, so
//! values starting with `-` and trailing extras still reach [`run`] and produce a
//! JSON envelope instead of a usage error.

use crate::config::Config;
use crate::draft::DraftService;
use crate::error::{Error, Result};
use crate::pipeline::Processor;
use clap::{Parser, Subcommand};
use std::path::Path;

/// Publish images and drafts to a WeChat Official Account
///
/// Every command prints exactly one JSON object on stdout.
#[derive(Parser, Debug)]
#[command(name = "md2wechat", version, about)]
#[command(after_help = ENVIRONMENT_HELP)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The commands the binary dispatches
#[derive(Subcommand, Debug, PartialEq, Eq)]
#[command(rename_all = "snake_case")]
pub enum Command {
    /// Upload a local image to the material library
    UploadImage {
        /// Image file to upload (extra values are ignored)
        #[arg(value_name = "FILE_PATH", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Download an online image and upload it
    DownloadAndUpload {
        /// Image URL (extra values are ignored)
        #[arg(value_name = "URL", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Generate an image with AI and upload it
    GenerateImage {
        /// Prompt describing the image (extra values are ignored)
        #[arg(value_name = "PROMPT", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Create a draft from a JSON file of articles
    CreateDraft {
        /// `{"articles": [...]}` document (extra values are ignored)
        #[arg(value_name = "JSON_FILE", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

const ENVIRONMENT_HELP: &str = "\
Environment Variables:
  WECHAT_APPID         WeChat Official Account AppID (required)
  WECHAT_SECRET        WeChat API Secret (required)
  IMAGE_API_KEY        Image generation API key (for AI images)
  IMAGE_API_BASE       Image API base URL (default: https://api.openai.com/v1)
  COMPRESS_IMAGES      Compress oversized images (default: true)
  MAX_IMAGE_WIDTH      Max image width in pixels (default: 1920)
  MAX_IMAGE_SIZE       Size in bytes from which images are compressed (default: 5242880)
  HTTP_TIMEOUT         Per-request timeout in seconds (default: 30)
  RUST_LOG             Log filter, logs go to stderr (default: info)";

/// Run one command and return the JSON payload of its success envelope
pub async fn run(command: Command, config: Config) -> Result<serde_json::Value> {
    let value = match command {
        Command::UploadImage { args } => {
            let file_path = required(&args, "file_path")?;
            let processor = Processor::new(config)?;
            serde_json::to_value(processor.upload_local(Path::new(file_path)).await?)?
        }
        Command::DownloadAndUpload { args } => {
            let url = required(&args, "url")?;
            let processor = Processor::new(config)?;
            serde_json::to_value(processor.download_and_upload(url).await?)?
        }
        Command::GenerateImage { args } => {
            let prompt = required(&args, "prompt")?;
            let processor = Processor::new(config)?;
            serde_json::to_value(processor.generate_and_upload(prompt).await?)?
        }
        Command::CreateDraft { args } => {
            let json_file = required(&args, "json_file")?;
            let processor = Processor::new(config)?;
            let drafts = DraftService::new(processor.platform());
            serde_json::to_value(drafts.create_draft_from_file(Path::new(json_file)).await?)?
        }
    };
    Ok(value)
}

/// The first argument, or `"<name> is required"` when there is none
fn required<'a>(args: &'a [String], name: &str) -> Result<&'a str> {
    args.first()
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::validation(format!("{name} is required")))
}
