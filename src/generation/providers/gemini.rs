//! Gemini (Google) multimodal text generation client.

use crate::error::{sanitize_error_message, RecipeGenError, Result};
use crate::generation::provider::GenerativeClient;
use crate::generation::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Public Generative Language API endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked, in order, when no API key is given.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Finish reasons that mean the candidate text was withheld.
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

/// Builder for GeminiClient.
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model identifier. Defaults to [`DEFAULT_GEMINI_MODEL`].
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the API base URL (useful for proxies and tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets a transport-level timeout for each HTTP call. None by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|key| !key.trim().is_empty())
            })
            .ok_or_else(|| {
                RecipeGenError::Auth(
                    "GOOGLE_API_KEY / GEMINI_API_KEY not set and no API key provided".into(),
                )
            })?;

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let client = http.build().map_err(RecipeGenError::transport)?;

        Ok(GeminiClient {
            client,
            api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Gemini client. Construct once and share across requests.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<String> {
        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::from_generation_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RecipeGenError::transport)?;

        let status = response.status();
        let text = response.text().await.map_err(RecipeGenError::transport)?;
        if !status.is_success() {
            return Err(RecipeGenError::RemoteService {
                status: Some(status.as_u16()),
                message: sanitize_error_message(&text),
            });
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| RecipeGenError::RemoteService {
                status: Some(status.as_u16()),
                message: format!("malformed response envelope: {e}"),
            })?;

        let generated = extract_text(gemini_response)?;
        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            text_len = generated.len(),
            "Gemini generation complete"
        );
        Ok(generated)
    }
}

/// Pulls the generated text out of a decoded response envelope.
///
/// All text parts of the first candidate are joined in order. Anything that
/// does not yield non-empty text is an invalid response.
fn extract_text(response: GeminiResponse) -> Result<String> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        tracing::debug!(block_reason = %reason, "Gemini blocked the prompt");
        return Err(RecipeGenError::InvalidResponse);
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        tracing::debug!("no candidates in Gemini response");
        return Err(RecipeGenError::InvalidResponse);
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKED_FINISH_REASONS.contains(&reason) {
            tracing::debug!(finish_reason = %reason, "Gemini withheld the candidate");
            return Err(RecipeGenError::InvalidResponse);
        }
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        tracing::debug!("no text parts in Gemini candidate");
        return Err(RecipeGenError::InvalidResponse);
    }
    Ok(text)
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.generate_impl(request).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(RecipeGenError::transport)?;

        match response.status().as_u16() {
            401 | 403 => Err(RecipeGenError::Auth("Invalid API key".into())),
            s if !(200..300).contains(&s) => Err(RecipeGenError::RemoteService {
                status: Some(s),
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request: inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        // Image part first, then the instruction
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image.mime_type.clone(),
                    data: req.image.data.clone(),
                },
            },
            GeminiRequestPart::Text {
                text: req.prompt.clone(),
            },
        ];

        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts,
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::image::EncodedImage;
    use mockito::Matcher;
    use serde_json::json;

    const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            EncodedImage::new("image/jpeg", "/9j/4AAQ"),
            "Provide a recipe for these baked goods",
        )
    }

    fn client_for(server: &mockito::Server) -> GeminiClient {
        GeminiClient::builder()
            .api_key("test-key")
            .base_url(server.url())
            .build()
            .unwrap()
    }

    fn parse(json: &str) -> GeminiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .model("gemini-2.0-flash")
            .build()
            .unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash");
        assert_eq!(client.base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_builder_defaults_and_trims_base_url() {
        let client = GeminiClient::builder()
            .api_key("k")
            .base_url("http://localhost:9000/v1beta/")
            .build()
            .unwrap();
        assert_eq!(client.model(), DEFAULT_GEMINI_MODEL);
        assert_eq!(
            client.model_url(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GeminiClient::builder().api_key("secret").build().unwrap();
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[test]
    fn test_request_wire_format() {
        let body = serde_json::to_value(GeminiRequest::from_generation_request(&request())).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}},
                        {"text": "Provide a recipe for these baked goods"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_extract_joins_text_parts() {
        let resp = parse(
            r#"{"candidates": [{
                "content": {"parts": [{"text": "Mix flour "}, {"text": "and sugar."}]},
                "finishReason": "STOP"
            }]}"#,
        );
        assert_eq!(extract_text(resp).unwrap(), "Mix flour and sugar.");
    }

    #[test]
    fn test_extract_invalid_envelopes() {
        let cases = [
            r#"{}"#,
            r#"{"candidates": []}"#,
            r#"{"candidates": [{"finishReason": "STOP"}]}"#,
            r#"{"candidates": [{"content": {"parts": [{}]}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": ""}]}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": "x"}]}, "finishReason": "SAFETY"}]}"#,
            r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#,
        ];
        for case in cases {
            let err = extract_text(parse(case)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidResponse, "case: {case}");
        }
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Json(json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}},
                        {"text": "Provide a recipe for these baked goods"}
                    ]
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Mix flour and sugar."}]}}]}"#)
            .create_async()
            .await;

        let text = client_for(&server).generate(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Mix flour and sugar.");
    }

    #[tokio::test]
    async fn test_generate_http_error_is_remote_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(400)
            .with_body(r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        match err {
            RecipeGenError::RemoteService { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_malformed_envelope_is_remote_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteService);
    }

    #[tokio::test]
    async fn test_generate_without_text_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": []}}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid response from the AI model.");
    }

    #[tokio::test]
    async fn test_generate_unreachable_is_remote_service() {
        let client = GeminiClient::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteService);
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/models/gemini-1.5-flash")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        client_for(&server).health_check().await.unwrap();
        ok.assert_async().await;

        let mut server = mockito::Server::new_async().await;
        let _denied = server
            .mock("GET", "/models/gemini-1.5-flash")
            .with_status(403)
            .create_async()
            .await;
        let err = client_for(&server).health_check().await.unwrap_err();
        assert!(matches!(err, RecipeGenError::Auth(_)));
    }

    #[tokio::test]
    async fn test_health_check_other_statuses_are_remote_service() {
        for status in [404, 500] {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/models/gemini-1.5-flash")
                .with_status(status)
                .create_async()
                .await;

            let err = client_for(&server).health_check().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RemoteService, "status {status}");
            match err {
                RecipeGenError::RemoteService { status: got, .. } => {
                    assert_eq!(got, Some(status as u16))
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
