//! Draft creation from article lists
//!
//! Articles are validated in full before the platform is contacted, then mapped to
//! the draft endpoint's payload shape and submitted once (no retry).

use crate::error::{Error, Result};
use crate::types::DraftResult;
use crate::wechat::{DraftArticle, PlatformApi};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// An article as supplied by the user
///
/// Optional text fields may be absent or empty; both mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article title (required)
    #[serde(default)]
    pub title: String,
    /// Author name
    #[serde(default)]
    pub author: String,
    /// Summary shown in share cards
    #[serde(default)]
    pub digest: String,
    /// HTML body (required)
    #[serde(default)]
    pub content: String,
    /// "Read more" link target
    #[serde(default)]
    pub content_source_url: String,
    /// Media id of the cover image, usually from a previous upload
    #[serde(default)]
    pub thumb_media_id: String,
    /// Show the cover at the top of the body: 0 or 1
    #[serde(default)]
    pub show_cover_pic: Option<i64>,
}

/// The draft input document: `{"articles": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRequest {
    /// Articles in display order, at least one
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl Article {
    /// The article's digest, or one derived from its content when empty
    pub fn digest_or_generated(&self) -> String {
        if self.digest.is_empty() {
            digest_from_content(&self.content, DEFAULT_DIGEST_CHARS)
        } else {
            self.digest.clone()
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::validation(format!("article {index}: title is required")));
        }
        if self.content.is_empty() {
            return Err(Error::validation(format!(
                "article {index}: content is required"
            )));
        }
        if let Some(flag) = self.show_cover_pic
            && !matches!(flag, 0 | 1)
        {
            return Err(Error::validation(format!(
                "article {index}: show_cover_pic must be 0 or 1, got {flag}"
            )));
        }
        Ok(())
    }

    /// Map to the endpoint payload, dropping unset optional fields
    ///
    /// `show_cover_pic` only means something alongside a cover, so it is sent only
    /// when `thumb_media_id` is set.
    fn to_draft_article(&self) -> DraftArticle {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let thumb_media_id = non_empty(&self.thumb_media_id);
        let show_cover_pic = thumb_media_id
            .as_ref()
            .map(|_| self.show_cover_pic.unwrap_or(0) as u8);

        DraftArticle {
            title: self.title.clone(),
            author: non_empty(&self.author),
            digest: non_empty(&self.digest),
            content: self.content.clone(),
            content_source_url: non_empty(&self.content_source_url),
            thumb_media_id,
            show_cover_pic,
        }
    }
}

/// Digest length used when none is given
pub const DEFAULT_DIGEST_CHARS: usize = 120;

// Closing tags that end a visual line
const LINE_BREAK_TAGS: &[&str] = &["</p>", "<br/>", "<br>", "</div>", "</h1>", "</h2>", "</h3>"];

/// Plain-text summary of HTML `content`, at most `max_chars` characters plus "..."
///
/// Tags are dropped and block ends become line breaks. `max_chars == 0` means
/// [`DEFAULT_DIGEST_CHARS`]. Truncation counts characters, never splitting one.
pub fn digest_from_content(content: &str, max_chars: usize) -> String {
    let max_chars = if max_chars == 0 {
        DEFAULT_DIGEST_CHARS
    } else {
        max_chars
    };

    let mut text = content.to_string();
    for tag in LINE_BREAK_TAGS {
        text = text.replace(tag, "\n");
    }

    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    let plain = plain.trim();

    match plain.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &plain[..cut]),
        None => plain.to_string(),
    }
}

/// Check an article list, reporting the first offending article by index
pub fn validate_articles(articles: &[Article]) -> Result<()> {
    if articles.is_empty() {
        return Err(Error::validation("no articles in request"));
    }
    for (index, article) in articles.iter().enumerate() {
        article.validate(index)?;
    }
    Ok(())
}

/// Creates drafts on the platform
pub struct DraftService {
    platform: Arc<dyn PlatformApi>,
}

impl DraftService {
    /// Create a service submitting through `platform`
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self { platform }
    }

    /// Validate `articles` and create one draft containing them
    pub async fn create_draft(&self, articles: &[Article]) -> Result<DraftResult> {
        validate_articles(articles)?;

        let payload: Vec<DraftArticle> = articles.iter().map(Article::to_draft_article).collect();
        tracing::info!(articles = payload.len(), "creating draft");

        let media_id = self.platform.add_draft(&payload).await?;
        Ok(DraftResult {
            media_id,
            draft_url: None,
        })
    }

    /// Read a `{"articles": [...]}` document from `path` and create the draft
    pub async fn create_draft_from_file(&self, path: &Path) -> Result<DraftResult> {
        tracing::info!(file = %path.display(), "creating draft from file");

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let request: DraftRequest = serde_json::from_slice(&data)
            .map_err(|e| Error::validation(format!("parse json: {e}")))?;

        self.create_draft(&request.articles).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::wechat::MaterialUpload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records submitted drafts and answers with a fixed media id
    #[derive(Default)]
    struct RecordingPlatform {
        drafts: Mutex<Vec<Vec<DraftArticle>>>,
    }

    impl RecordingPlatform {
        fn submissions(&self) -> Vec<Vec<DraftArticle>> {
            self.drafts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlatformApi for RecordingPlatform {
        async fn upload_image(&self, _path: &Path) -> Result<MaterialUpload> {
            unreachable!("drafts never upload images")
        }

        async fn add_draft(&self, articles: &[DraftArticle]) -> Result<String> {
            self.drafts.lock().unwrap().push(articles.to_vec());
            Ok("DRAFT_MEDIA".to_string())
        }
    }

    fn service() -> (Arc<RecordingPlatform>, DraftService) {
        let platform = Arc::new(RecordingPlatform::default());
        (platform.clone(), DraftService::new(platform))
    }

    fn article(title: &str, content: &str) -> Article {
        Article {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_article_list_is_rejected_without_network() {
        let (platform, service) = service();

        let err = service.create_draft(&[]).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "no articles in request");
        assert!(platform.submissions().is_empty());
    }

    #[tokio::test]
    async fn missing_title_is_reported_with_its_index() {
        let (platform, service) = service();
        let articles = vec![article("First", "<p>a</p>"), article("", "<p>b</p>")];

        let err = service.create_draft(&articles).await.unwrap_err();

        assert_eq!(err.to_string(), "article 1: title is required");
        assert!(platform.submissions().is_empty());
    }

    #[tokio::test]
    async fn missing_content_is_reported() {
        let (_, service) = service();

        let err = service.create_draft(&[article("T", "")]).await.unwrap_err();
        assert_eq!(err.to_string(), "article 0: content is required");
    }

    #[test]
    fn show_cover_pic_must_be_a_flag() {
        let mut bad = article("T", "C");
        bad.show_cover_pic = Some(2);

        let err = validate_articles(&[bad]).unwrap_err();
        assert!(err.to_string().starts_with("article 0: show_cover_pic"), "{err}");
    }

    #[tokio::test]
    async fn unset_optional_fields_are_omitted_from_payload() {
        let (platform, service) = service();

        let result = service
            .create_draft(&[article("Title", "<p>Hello</p>")])
            .await
            .unwrap();
        assert_eq!(result.media_id, "DRAFT_MEDIA");
        assert_eq!(result.draft_url, None);

        let sent = &platform.submissions()[0][0];
        let json = serde_json::to_value(sent).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Title", "content": "<p>Hello</p>"})
        );
    }

    #[test]
    fn cover_fields_travel_together() {
        let with_cover = Article {
            thumb_media_id: "THUMB".into(),
            show_cover_pic: Some(1),
            author: "Ann".into(),
            content_source_url: "https://example.com/post".into(),
            ..article("T", "C")
        };
        let payload = with_cover.to_draft_article();
        assert_eq!(payload.thumb_media_id.as_deref(), Some("THUMB"));
        assert_eq!(payload.show_cover_pic, Some(1));
        assert_eq!(payload.author.as_deref(), Some("Ann"));
        assert_eq!(
            payload.content_source_url.as_deref(),
            Some("https://example.com/post")
        );
        assert_eq!(payload.digest, None);

        let flag_without_cover = Article {
            show_cover_pic: Some(1),
            ..article("T", "C")
        };
        let payload = flag_without_cover.to_draft_article();
        assert_eq!(payload.thumb_media_id, None);
        assert_eq!(payload.show_cover_pic, None);
    }

    #[test]
    fn digest_strips_markup_and_truncates_by_character() {
        let content = "<h1>标题</h1><p>第一段<b>重点</b></p><p>second</p>";
        assert_eq!(digest_from_content(content, 0), "标题\n第一段重点\nsecond");
        assert_eq!(digest_from_content(content, 4), "标题\n第...");
        assert_eq!(digest_from_content("<p>short</p>", 5), "short");
    }

    #[test]
    fn explicit_digest_wins_over_generated() {
        let mut a = article("T", "<p>Body text</p>");
        assert_eq!(a.digest_or_generated(), "Body text");

        a.digest = "Custom".into();
        assert_eq!(a.digest_or_generated(), "Custom");
    }

    #[tokio::test]
    async fn from_file_reads_articles_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("draft.json");
        std::fs::write(
            &file,
            r#"{"articles": [{"title": "A", "content": "<p>x</p>", "digest": "short"}]}"#,
        )
        .unwrap();
        let (platform, service) = service();

        let result = service.create_draft_from_file(&file).await.unwrap();

        assert_eq!(result.media_id, "DRAFT_MEDIA");
        let sent = platform.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0][0].digest.as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn from_file_missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (_, service) = service();

        let err = service
            .create_draft_from_file(&dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn from_file_malformed_json_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("draft.json");
        std::fs::write(&file, "{not json").unwrap();
        let (platform, service) = service();

        let err = service.create_draft_from_file(&file).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)), "got {err:?}");
        assert!(err.to_string().starts_with("parse json:"));
        assert!(platform.submissions().is_empty());
    }
}
