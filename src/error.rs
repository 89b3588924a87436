//! Error types for the recipe generation pipeline.

/// Maximum number of characters of a remote error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Errors that can occur while generating a recipe.
#[derive(Debug, thiserror::Error)]
pub enum RecipeGenError {
    /// Image bytes could not be obtained (network or filesystem).
    #[error("failed to fetch image '{locator}': {reason}")]
    Fetch {
        /// Locator of the image that failed.
        locator: String,
        /// Underlying cause.
        reason: String,
    },

    /// Binary-to-base64 conversion failed before the full payload was read.
    #[error("failed to encode image: {0}")]
    Encoding(String),

    /// Transport or protocol failure talking to the generative model.
    #[error("{}", remote_service_message(.status, .message))]
    RemoteService {
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// Error detail.
        message: String,
    },

    /// The model answered but the response carried no usable text.
    #[error("Invalid response from the AI model.")]
    InvalidResponse,

    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Invalid request parameters (empty locator, unknown catalog entry).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn remote_service_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("remote service error: {status} - {message}"),
        None => format!("remote service error: {message}"),
    }
}

/// Coarse classification of [`RecipeGenError`] along the pipeline taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Image bytes unobtainable.
    Fetch,
    /// Base64 conversion failed mid-stream.
    Encoding,
    /// Transport/protocol failure with the remote model.
    RemoteService,
    /// Remote call succeeded but yielded no text.
    InvalidResponse,
    /// Configuration or caller error outside the pipeline steps.
    Other,
}

impl RecipeGenError {
    /// Builds a fetch error for the given locator.
    pub fn fetch(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a remote service error without an HTTP status.
    pub fn transport(message: impl std::fmt::Display) -> Self {
        Self::RemoteService {
            status: None,
            message: message.to_string(),
        }
    }

    /// Returns the pipeline category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::RemoteService { .. } => ErrorKind::RemoteService,
            Self::InvalidResponse => ErrorKind::InvalidResponse,
            _ => ErrorKind::Other,
        }
    }
}

/// Result type alias for recipe generation operations.
pub type Result<T> = std::result::Result<T, RecipeGenError>;

/// Extracts a readable message from a remote error body.
///
/// Gemini wraps failures in `{"error": {"message": ...}}`; when that shape is
/// present only the inner message is kept. Whitespace is collapsed and the
/// result is truncated so raw HTML error pages don't end up in user output.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    let collapsed = extracted.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(
            RecipeGenError::fetch("a.jpg", "not found").kind(),
            ErrorKind::Fetch
        );
        assert_eq!(
            RecipeGenError::Encoding("eof".into()).kind(),
            ErrorKind::Encoding
        );
        assert_eq!(
            RecipeGenError::transport("timed out").kind(),
            ErrorKind::RemoteService
        );
        assert_eq!(
            RecipeGenError::InvalidResponse.kind(),
            ErrorKind::InvalidResponse
        );
        assert_eq!(RecipeGenError::Auth("x".into()).kind(), ErrorKind::Other);
    }

    #[test]
    fn test_error_display() {
        let err = RecipeGenError::fetch("assets/images/missing.jpg", "404 Not Found");
        assert_eq!(
            err.to_string(),
            "failed to fetch image 'assets/images/missing.jpg': 404 Not Found"
        );

        let err = RecipeGenError::RemoteService {
            status: Some(503),
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "remote service error: 503 - overloaded");

        let err = RecipeGenError::transport("connection refused");
        assert_eq!(err.to_string(), "remote service error: connection refused");

        assert_eq!(
            RecipeGenError::InvalidResponse.to_string(),
            "Invalid response from the AI model."
        );
    }

    #[test]
    fn test_sanitize_extracts_gemini_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(sanitize_error_message(body), "API key not valid.");
    }

    #[test]
    fn test_sanitize_collapses_and_truncates() {
        assert_eq!(sanitize_error_message("bad\n\n  gateway"), "bad gateway");

        let long = "x".repeat(MAX_ERROR_MESSAGE_LEN + 50);
        let cleaned = sanitize_error_message(&long);
        assert_eq!(cleaned.len(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(cleaned.ends_with("..."));
    }
}
