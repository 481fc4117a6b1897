//! Retrying material upload

use super::traits::{MaterialUpload, PlatformApi};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::{IsRetryable, with_retry};
use std::path::Path;

/// Upload `path` to the material library, retrying transient failures
///
/// Makes at most `retry.max_attempts` attempts. Validation-class failures (e.g. an
/// unsupported file type) are returned after the first attempt. When every attempt
/// fails transiently the result is [`Error::UploadExhausted`] carrying the last
/// cause.
///
/// A retried upload may leave a duplicate media object on the platform if an
/// earlier attempt succeeded but its response was lost.
pub async fn upload_with_retry(
    platform: &dyn PlatformApi,
    path: &Path,
    retry: &RetryConfig,
) -> Result<MaterialUpload> {
    let attempts = retry.max_attempts.max(1);
    tracing::info!(path = %path.display(), max_attempts = attempts, "uploading image");

    match with_retry(retry, || platform.upload_image(path)).await {
        Ok(upload) => Ok(upload),
        Err(e) if e.is_retryable() => Err(Error::UploadExhausted {
            attempts,
            last: Box::new(e),
        }),
        Err(e) => Err(e),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::wechat::DraftArticle;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Platform double that fails with the queued errors, then succeeds
    struct ScriptedPlatform {
        failures: Mutex<Vec<Error>>,
        calls: AtomicU32,
    }

    impl ScriptedPlatform {
        fn failing_with(mut failures: Vec<Error>) -> Self {
            failures.reverse();
            Self {
                failures: Mutex::new(failures),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlatformApi for ScriptedPlatform {
        async fn upload_image(&self, _path: &Path) -> Result<MaterialUpload> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(MaterialUpload {
                media_id: format!("MEDIA_{call}"),
                url: format!("http://mmbiz.qpic.cn/{call}.jpg"),
            })
        }

        async fn add_draft(&self, _articles: &[DraftArticle]) -> Result<String> {
            unreachable!("uploads never create drafts")
        }
    }

    fn retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    fn busy() -> Error {
        Error::Platform {
            errcode: -1,
            errmsg: "system error".into(),
        }
    }

    fn unavailable() -> Error {
        Error::Http {
            status: 503,
            url: "https://api.weixin.qq.com/cgi-bin/material/add_material".into(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn third_attempt_result_is_returned_after_two_failures() {
        let platform = ScriptedPlatform::failing_with(vec![busy(), unavailable()]);

        let upload = upload_with_retry(&platform, Path::new("a.jpg"), &retry())
            .await
            .unwrap();

        assert_eq!(upload.media_id, "MEDIA_3");
        assert_eq!(platform.calls(), 3);
    }

    #[tokio::test]
    async fn exhaustion_wraps_last_error() {
        let platform = ScriptedPlatform::failing_with(vec![busy(), busy(), unavailable(), busy()]);

        let err = upload_with_retry(&platform, Path::new("a.jpg"), &retry())
            .await
            .unwrap_err();

        assert_eq!(platform.calls(), 3, "never more than max_attempts");
        match err {
            Error::UploadExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, Error::Http { status: 503, .. }));
            }
            other => panic!("expected UploadExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn validation_failure_short_circuits_after_first_attempt() {
        let platform = ScriptedPlatform::failing_with(vec![Error::Platform {
            errcode: 40005,
            errmsg: "invalid file type".into(),
        }]);

        let err = upload_with_retry(&platform, Path::new("a.tiff"), &retry())
            .await
            .unwrap_err();

        assert_eq!(platform.calls(), 1);
        assert!(matches!(err, Error::Platform { errcode: 40005, .. }));
    }

    #[tokio::test]
    async fn first_attempt_success_makes_one_call() {
        let platform = ScriptedPlatform::failing_with(vec![]);

        let upload = upload_with_retry(&platform, Path::new("a.jpg"), &retry())
            .await
            .unwrap();

        assert_eq!(upload.media_id, "MEDIA_1");
        assert_eq!(platform.calls(), 1);
    }
}
