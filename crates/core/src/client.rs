use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::quiz::{Answer, GeneratedQuiz, QuizFormat, QuizResult, RefreshedQuestion};

/// A caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub code: String,
    pub base_url: String,
    #[serde(default)]
    pub is_auto: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoLookup {
    pub languages: Vec<Language>,
    pub video_title: String,
    pub channel_info: ChannelInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Captions {
    pub captions: Vec<String>,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub recommended_questions: Vec<String>,
}

/// Links accepted by one collection request.
pub const MAX_COLLECTION_LINKS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Channels,
    Videos,
}

impl CollectionKind {
    fn endpoint(self) -> &'static str {
        match self {
            CollectionKind::Channels => "/fetch_channel_data",
            CollectionKind::Videos => "/fetch_video_data",
        }
    }

    fn request_body(self, links: &[String]) -> Value {
        match self {
            CollectionKind::Channels => json!({ "channel_urls": links }),
            CollectionKind::Videos => json!({ "video_urls": links }),
        }
    }
}

/// Trimmed non-blank links, capped at [`MAX_COLLECTION_LINKS`].
pub fn collection_links(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .take(MAX_COLLECTION_LINKS)
        .map(str::to_string)
        .collect()
}

/// One file handed to the service when learning a whole folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderFile {
    pub name: String,
    pub content: String,
}

/// HTTP client for the captioning, Q&A and quiz service.
#[derive(Debug, Clone)]
pub struct CaptionClient {
    http: reqwest::Client,
    base_url: String,
}

impl CaptionClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn lookup_video(&self, youtube_url: &str) -> Result<VideoLookup, ApiError> {
        self.post("/", &json!({ "youtube_url": youtube_url })).await
    }

    pub async fn fetch_captions(
        &self,
        language: &Language,
        video_title: &str,
    ) -> Result<Captions, ApiError> {
        self.post(
            "/get_captions",
            &json!({
                "base_url": language.base_url,
                "lang_code": language.code,
                "is_auto": language.is_auto,
                "video_title": video_title,
            }),
        )
        .await
    }

    pub async fn ask_question(&self, question: &str) -> Result<String, ApiError> {
        let response = self
            .post_value("/ask_question", &json!({ "question": question }))
            .await?;
        extract_answer(&response)
    }

    /// Channel or video metadata for a batch of links. The service's JSON is passed through.
    pub async fn fetch_collection(
        &self,
        kind: CollectionKind,
        urls: &[String],
    ) -> Result<Value, ApiError> {
        let links = collection_links(urls);
        if links.is_empty() {
            return Err(ApiError::InvalidUrl {
                url: String::new(),
                reason: "Please enter at least one link.".to_string(),
            });
        }
        self.post_value(kind.endpoint(), &kind.request_body(&links))
            .await
    }

    /// Ask the service to digest a folder's files. Older servers expect the files
    /// under `files`, so a failed first attempt is retried once in that shape.
    pub async fn learn_folder_content(
        &self,
        folder_name: &str,
        files: &[FolderFile],
    ) -> Result<Vec<String>, ApiError> {
        let primary = json!({ "folder_name": folder_name, "folder_content": files });
        let response = match self.post_value("/learn_folder_content", &primary).await {
            Ok(response) => response,
            Err(e) => {
                warn!(folder = folder_name, error = %e, "primary folder payload rejected, retrying");
                let alternate = json!({ "folder_name": folder_name, "files": files });
                self.post_value("/learn_folder_content", &alternate).await?
            }
        };
        Ok(extract_captions(&response))
    }

    pub async fn generate_quiz(
        &self,
        video_id: &str,
        num_questions: u32,
        format: QuizFormat,
    ) -> Result<GeneratedQuiz, ApiError> {
        self.post(
            "/generate_quiz",
            &json!({
                "num_questions": num_questions,
                "question_type": format,
                "video_id": video_id,
            }),
        )
        .await
    }

    pub async fn refresh_quiz_question(
        &self,
        session_id: &str,
        question_index: usize,
    ) -> Result<RefreshedQuestion, ApiError> {
        self.post(
            "/refresh_quiz_question",
            &json!({ "session_id": session_id, "question_index": question_index }),
        )
        .await
    }

    pub async fn submit_quiz(
        &self,
        session_id: &str,
        answers: &[Option<Answer>],
    ) -> Result<QuizResult, ApiError> {
        self.post(
            "/submit_quiz",
            &json!({ "session_id": session_id, "answers": answers }),
        )
        .await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let value = self.post_value(path, body).await?;
        decode(value)
    }

    async fn post_value(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        info!(%url, "calling captioning service");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        interpret_response(status, &text)
    }
}

/// Turn a raw status and body into the JSON payload or the matching error.
/// A non-empty `error` field wins over the status code.
fn interpret_response(status: u16, body: &str) -> Result<Value, ApiError> {
    let parsed = serde_json::from_str::<Value>(body).ok();

    if let Some(message) = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
    {
        return Err(ApiError::Service {
            message: message.to_string(),
        });
    }

    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            body: body.to_string(),
        });
    }

    parsed.ok_or_else(|| ApiError::InvalidResponse {
        reason: "response body is not JSON".to_string(),
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse {
        reason: e.to_string(),
    })
}

fn extract_answer(response: &Value) -> Result<String, ApiError> {
    response
        .get("answer")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidResponse {
            reason: "Failed to get an answer.".to_string(),
        })
}

/// Captions returned by folder learning. Anything but an array of strings counts as none.
fn extract_captions(response: &Value) -> Vec<String> {
    response
        .get("captions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_status() {
        let err = interpret_response(200, r#"{"error": "No captions available"}"#).unwrap_err();
        assert_eq!(err.user_message(), "No captions available");

        let err = interpret_response(500, r#"{"error": "boom"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Service { .. }));
    }

    #[test]
    fn blank_error_field_is_ignored() {
        let value = interpret_response(200, r#"{"error": "", "answer": "42"}"#).unwrap();
        assert_eq!(extract_answer(&value).unwrap(), "42");
    }

    #[test]
    fn non_success_status_without_error_field() {
        let err = interpret_response(502, "Bad Gateway").unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_success_is_invalid() {
        let err = interpret_response(200, "<html></html>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn video_lookup_requires_all_fields() {
        let value: Value = serde_json::from_str(
            r#"{
                "languages": [{"name": "English", "code": "en", "base_url": "https://x/en", "is_auto": true}],
                "video_title": "Intro to Rust",
                "channel_info": {"name": "Rustaceans", "avatar": "https://x/a.png"}
            }"#,
        )
        .unwrap();
        let lookup: VideoLookup = decode(value).unwrap();
        assert_eq!(lookup.languages[0].code, "en");
        assert!(lookup.languages[0].is_auto);
        assert_eq!(lookup.channel_info.name, "Rustaceans");

        let missing = json!({ "languages": [], "video_title": "x" });
        let err = decode::<VideoLookup>(missing).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn captions_tolerate_missing_optional_fields() {
        let captions: Captions = decode(json!({ "captions": ["a", "b"] })).unwrap();
        assert_eq!(captions.captions, vec!["a", "b"]);
        assert_eq!(captions.total_pages, 0);
        assert!(captions.recommended_questions.is_empty());
    }

    #[test]
    fn missing_answer_is_reported() {
        let err = extract_answer(&json!({})).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Invalid response from server: Failed to get an answer."
        );
    }

    #[test]
    fn folder_captions_must_be_a_string_array() {
        assert_eq!(
            extract_captions(&json!({ "captions": ["one", 2, "three"] })),
            vec!["one", "three"]
        );
        assert!(extract_captions(&json!({ "captions": "flat" })).is_empty());
        assert!(extract_captions(&json!({})).is_empty());
    }

    #[test]
    fn collection_links_drop_blanks_and_cap_at_ten() {
        let mut urls = vec!["  ".to_string(), " https://youtube.com/@rust ".to_string()];
        urls.extend((0..12).map(|i| format!("https://youtu.be/video{:06}", i)));

        let links = collection_links(&urls);
        assert_eq!(links.len(), MAX_COLLECTION_LINKS);
        assert_eq!(links[0], "https://youtube.com/@rust");
        assert_eq!(links[9], "https://youtu.be/video000008");
    }

    #[test]
    fn collection_request_bodies() {
        let links = vec!["https://youtube.com/@rust".to_string()];
        assert_eq!(CollectionKind::Channels.endpoint(), "/fetch_channel_data");
        assert_eq!(
            CollectionKind::Channels.request_body(&links),
            json!({ "channel_urls": ["https://youtube.com/@rust"] })
        );
        assert_eq!(CollectionKind::Videos.endpoint(), "/fetch_video_data");
        assert_eq!(
            CollectionKind::Videos.request_body(&links),
            json!({ "video_urls": ["https://youtube.com/@rust"] })
        );
    }

    #[tokio::test]
    async fn collection_without_links_is_rejected_before_sending() {
        let client = CaptionClient::new(&Config::default()).unwrap();
        let err = client
            .fetch_collection(CollectionKind::Videos, &[" ".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Please enter at least one link.");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = Config {
            api_url: "http://localhost:5000/".to_string(),
            ..Config::default()
        };
        let client = CaptionClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
