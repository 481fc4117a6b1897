//! Configuration and file fixtures

use md2wechat::{Config, RetryConfig};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// AppID every stubbed platform expects
pub const APP_ID: &str = "wx-test-app";
/// Secret every stubbed platform expects
pub const SECRET: &str = "wx-test-secret";

/// Config pointing at `api_base`, with a private temp dir and fast retries
///
/// Returns the temp dir too; keep it alive for the duration of the test.
pub fn test_config(api_base: &str) -> (Config, TempDir) {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = Config {
        wechat_app_id: APP_ID.to_string(),
        wechat_secret: SECRET.to_string(),
        wechat_api_base: api_base.to_string(),
        http_timeout: Duration::from_secs(5),
        temp_dir: Some(temp.path().to_path_buf()),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Config::default()
    };
    (config, temp)
}

/// Encoded PNG of a solid color
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("encode png");
    buffer.into_inner()
}

/// Write a PNG of the given size into `dir` and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(width, height)).expect("write png");
    path
}

/// Names of the entries currently in `dir`
pub fn dir_entries(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
