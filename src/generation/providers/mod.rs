//! Generative model clients.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{
    GeminiClient, GeminiClientBuilder, API_KEY_ENV_VARS, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL,
};
