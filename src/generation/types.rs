//! Request and result types for text generation.

use crate::error::{RecipeGenError, Result};
use crate::image::EncodedImage;
use serde::{Deserialize, Serialize};

/// Shown after `"Error: "` when a failure has no description.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

/// One image plus the instruction to apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The encoded image.
    pub image: EncodedImage,
    /// Prompt text, passed to the model verbatim.
    pub prompt: String,
}

impl GenerationRequest {
    /// Creates a new request.
    pub fn new(image: EncodedImage, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum GenerationResult {
    /// Generated text.
    Success(String),
    /// Human-readable failure description.
    Failure(String),
}

impl GenerationResult {
    /// Returns true for [`GenerationResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the text to show the user.
    ///
    /// Successes are returned verbatim; failures become `"Error: <message>"`.
    pub fn display_text(&self) -> String {
        match self {
            Self::Success(text) => text.clone(),
            Self::Failure(message) if message.trim().is_empty() => {
                format!("Error: {FALLBACK_ERROR_MESSAGE}")
            }
            Self::Failure(message) => format!("Error: {message}"),
        }
    }
}

impl From<Result<String>> for GenerationResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::Success(text),
            Err(err) => Self::from(err),
        }
    }
}

impl From<RecipeGenError> for GenerationResult {
    fn from(err: RecipeGenError) -> Self {
        Self::Failure(err.to_string())
    }
}

/// Renders newlines as `<br>` for HTML display.
pub fn format_for_display(text: &str) -> String {
    text.replace('\n', "<br>")
}
