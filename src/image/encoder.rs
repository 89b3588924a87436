//! Base64 encoding of fetched image bytes.

use crate::error::{RecipeGenError, Result};
use crate::image::types::{EncodedImage, RawImage};
use async_trait::async_trait;
use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Converts raw image bytes into a transport-safe payload.
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    /// Encodes the image, consuming it.
    async fn encode(&self, image: RawImage) -> Result<EncodedImage>;
}

/// Standard-alphabet, padded base64 encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encoder;

impl Base64Encoder {
    /// Creates a new encoder.
    pub fn new() -> Self {
        Self
    }

    /// Encodes bytes as base64 with no `data:` prefix. Never fails.
    pub fn encode_bytes(&self, bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    /// Reads `reader` to completion and encodes the captured bytes.
    ///
    /// Returns [`RecipeGenError::Encoding`] if the stream fails before its end.
    pub async fn encode_reader<R>(
        &self,
        mut reader: R,
        mime_type: impl Into<String>,
    ) -> Result<EncodedImage>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|e| RecipeGenError::Encoding(e.to_string()))?;

        Ok(EncodedImage::new(mime_type, self.encode_bytes(&buf)))
    }
}

#[async_trait]
impl ImageEncoder for Base64Encoder {
    async fn encode(&self, image: RawImage) -> Result<EncodedImage> {
        let mime_type = image.mime_type();
        let encoded = self.encode_reader(image.data.as_slice(), mime_type).await?;
        tracing::debug!(
            mime_type = %encoded.mime_type,
            encoded_len = encoded.data.len(),
            "encoded image"
        );
        Ok(encoded)
    }
}

/// Removes a leading `data:<mime>;base64,` prefix, if present.
pub fn strip_data_uri_prefix(payload: &str) -> &str {
    if !payload.starts_with("data:") {
        return payload;
    }
    match payload.find(";base64,") {
        Some(pos) => &payload[pos + ";base64,".len()..],
        None => payload,
    }
}
