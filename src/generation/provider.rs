//! Generative client trait.

use crate::error::Result;
use crate::generation::types::GenerationRequest;
use async_trait::async_trait;

/// A remote multimodal model that turns an image and a prompt into text.
///
/// Implementations are built once and shared; each `generate` call is
/// independent of the previous ones.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Submits one request and returns the generated text.
    ///
    /// Transport failures surface as `RemoteService`, responses without
    /// usable text as `InvalidResponse`. Nothing is retried.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Returns the model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Returns a display name for this client.
    fn name(&self) -> &str {
        "generative model"
    }

    /// Checks if the model is reachable and the credential accepted.
    async fn health_check(&self) -> Result<()>;
}
