//! Image conditioning: size-driven shrinking before upload
//!
//! Files below `max_image_size` (or every file, when compression is disabled) pass
//! through untouched. Larger files are decoded, downscaled so the longer side fits
//! `max_image_width`, and re-encoded into a scoped temporary file:
//! - images with an alpha channel become PNG
//! - everything else becomes JPEG, starting at quality 85 and stepping down while
//!   the output is still too large
//!
//! GIFs are never touched because re-encoding would drop their animation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::new_temp_file;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// JPEG qualities tried in order until the output fits
pub const JPEG_QUALITY_STEPS: &[u8] = &[85, 70, 55];

/// Outcome of conditioning a file
#[derive(Debug)]
pub enum Conditioned {
    /// The original file should be uploaded as is
    Unchanged,
    /// A smaller replacement was written
    Replaced(ConditionedImage),
}

/// A re-encoded replacement image, deleted when dropped
#[derive(Debug)]
pub struct ConditionedImage {
    /// Location of the replacement file
    pub path: TempPath,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Size of the replacement in bytes
    pub size: u64,
}

impl Conditioned {
    /// Path to upload: the replacement if there is one, otherwise `original`
    pub fn path_or<'a>(&'a self, original: &'a Path) -> &'a Path {
        match self {
            Conditioned::Unchanged => original,
            Conditioned::Replaced(image) => &*image.path,
        }
    }

    /// Dimensions of the replacement, if any
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Conditioned::Unchanged => None,
            Conditioned::Replaced(image) => Some((image.width, image.height)),
        }
    }
}

/// Applies the compression policy from [`Config`]
#[derive(Debug, Clone)]
pub struct Conditioner {
    enabled: bool,
    max_image_size: u64,
    max_image_width: u32,
    temp_dir: Option<PathBuf>,
}

impl Conditioner {
    /// Create a conditioner from the compression settings in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.compress_images,
            max_image_size: config.max_image_size,
            max_image_width: config.max_image_width.max(1),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Shrink `path` if policy requires it
    ///
    /// Returns [`Conditioned::Unchanged`] when compression is disabled or the file
    /// is below `max_image_size`. Errors are meant to be non-fatal for callers.
    pub async fn condition_if_needed(&self, path: &Path) -> Result<Conditioned> {
        if !self.enabled {
            return Ok(Conditioned::Unchanged);
        }

        let size = tokio::fs::metadata(path).await?.len();
        if size < self.max_image_size {
            return Ok(Conditioned::Unchanged);
        }

        tracing::info!(path = %path.display(), size, "compressing image");

        let this = self.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || this.shrink(&path, size))
            .await
            .map_err(|e| Error::Other(format!("image conditioning task failed: {e}")))?
    }

    fn shrink(&self, path: &Path, original_size: u64) -> Result<Conditioned> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        if reader.format() == Some(ImageFormat::Gif) {
            tracing::info!(path = %path.display(), "leaving GIF untouched");
            return Ok(Conditioned::Unchanged);
        }

        let decoded = reader.decode()?;
        let (width, height) = decoded.dimensions();
        let resized = width.max(height) > self.max_image_width;
        let image = if resized {
            decoded.resize(self.max_image_width, self.max_image_width, FilterType::Lanczos3)
        } else {
            decoded
        };

        let (bytes, extension) = self.encode(&image)?;
        if !resized && bytes.len() as u64 >= original_size {
            tracing::info!(
                path = %path.display(),
                "re-encoding did not reduce size, keeping original"
            );
            return Ok(Conditioned::Unchanged);
        }

        let mut file = new_temp_file(self.temp_dir.as_deref(), extension)?;
        file.write_all(&bytes)?;
        file.flush()?;

        let (width, height) = image.dimensions();
        let size = bytes.len() as u64;
        tracing::info!(
            original_size,
            size,
            width,
            height,
            format = extension,
            "image compressed"
        );

        Ok(Conditioned::Replaced(ConditionedImage {
            path: file.into_temp_path(),
            width,
            height,
            size,
        }))
    }

    fn encode(&self, image: &DynamicImage) -> Result<(Vec<u8>, &'static str)> {
        if image.color().has_alpha() {
            let mut buffer = Cursor::new(Vec::new());
            image.write_to(&mut buffer, ImageFormat::Png)?;
            return Ok((buffer.into_inner(), "png"));
        }

        let rgb = image.to_rgb8();
        let mut bytes = Vec::new();
        for &quality in JPEG_QUALITY_STEPS {
            bytes.clear();
            JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)?;
            if (bytes.len() as u64) < self.max_image_size {
                break;
            }
            tracing::debug!(quality, size = bytes.len(), "still above size limit");
        }
        Ok((bytes, "jpg"))
    }
}

/// Read the pixel dimensions of an image file, `(0, 0)` if they cannot be read
pub fn probe_dimensions(path: &Path) -> (u32, u32) {
    match image::image_dimensions(path) {
        Ok(dimensions) => dimensions,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not read image dimensions");
            (0, 0)
        }
    }
}
