//! Remote text generation from an image and a prompt.

mod provider;
pub mod providers;
mod types;

pub use provider::GenerativeClient;
pub use types::{format_for_display, GenerationRequest, GenerationResult, FALLBACK_ERROR_MESSAGE};
