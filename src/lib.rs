#![warn(missing_docs)]
//! recipegen - turn a photo of food and a prompt into a recipe.
//!
//! The crate wires a small pipeline: fetch the selected image, base64-encode
//! it, send it with a text prompt to a multimodal model, and keep the answer
//! (or an `Error: ...` line) as display-ready output.
//!
//! # Quick Start
//!
//! ```no_run
//! use recipegen::{GeminiClient, RecipeGenerationController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> recipegen::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let controller = RecipeGenerationController::builder(Arc::new(client)).build();
//!
//!     controller.select_image("Baked Good 2")?;
//!     controller.submit().await;
//!     println!("{}", controller.last_output());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): Gemini (Google) client
//! - `cli`: `recipegen` command-line interface

mod controller;
mod error;
pub mod generation;
pub mod image;

// Re-export error types at crate root
pub use error::{ErrorKind, RecipeGenError, Result};

pub use controller::{
    RecipeGenerationController, RecipeGenerationControllerBuilder, SessionState, SubmitOutcome,
};
pub use generation::{format_for_display, GenerationRequest, GenerationResult, GenerativeClient};
pub use image::{
    Base64Encoder, DefaultImageFetcher, EncodedImage, ImageCatalog, ImageEncoder, ImageFetcher,
    ImageReference, RawImage, DEFAULT_PROMPT,
};

#[cfg(feature = "gemini")]
pub use generation::providers::{GeminiClient, GeminiClientBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::controller::{RecipeGenerationController, SubmitOutcome};
    pub use crate::error::{RecipeGenError, Result};
    pub use crate::generation::{GenerationRequest, GenerationResult, GenerativeClient};
    pub use crate::image::{ImageCatalog, ImageFetcher, ImageReference};

    #[cfg(feature = "gemini")]
    pub use crate::generation::providers::GeminiClient;
}
