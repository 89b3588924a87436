//! Core image types shared by the fetcher and encoder.

use crate::error::{RecipeGenError, Result};
use serde::{Deserialize, Serialize};

/// MIME type used when neither the source nor the bytes identify the format.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Image formats recognized from extensions, MIME types, or magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Where an [`ImageReference`] points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// An `http://` or `https://` URL.
    Remote,
    /// A path to a bundled asset, resolved against the fetcher's asset root.
    Asset,
}

/// A locator identifying one selectable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    locator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl ImageReference {
    /// Creates a reference from a locator. Empty locators are rejected.
    pub fn new(locator: impl Into<String>) -> Result<Self> {
        let locator = locator.into();
        if locator.trim().is_empty() {
            return Err(RecipeGenError::InvalidRequest(
                "image locator must not be empty".into(),
            ));
        }
        Ok(Self {
            locator,
            label: None,
        })
    }

    /// Attaches a display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the locator string.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Returns the display label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns whether the locator is a URL or an asset path.
    pub fn kind(&self) -> ReferenceKind {
        let lower = self.locator.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ReferenceKind::Remote
        } else {
            ReferenceKind::Asset
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.locator)
    }
}

/// Raw image bytes as returned by an [`ImageFetcher`](crate::image::ImageFetcher).
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Full binary content.
    pub data: Vec<u8>,
    /// Declared content type, if the source provided one.
    pub content_type: Option<String>,
}

impl RawImage {
    /// Creates a raw image.
    pub fn new(data: Vec<u8>, content_type: Option<String>) -> Self {
        Self { data, content_type }
    }

    /// Resolves the MIME type to send alongside the encoded payload.
    ///
    /// A declared `image/*` content type wins, then magic-byte detection,
    /// then [`FALLBACK_MIME_TYPE`].
    pub fn mime_type(&self) -> String {
        if let Some(declared) = self.content_type.as_deref() {
            let essence = declared
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if essence.starts_with("image/") {
                return essence;
            }
        }
        ImageFormat::from_magic_bytes(&self.data)
            .map(|f| f.mime_type())
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string()
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A base64 image payload ready to be placed in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    /// MIME type of the image.
    pub mime_type: String,
    /// Base64 data, without any `data:` prefix.
    pub data: String,
}

impl EncodedImage {
    /// Creates an encoded image.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| RecipeGenError::InvalidRequest("not a data URL".into()))?;
        let (mime_type, data) = rest.split_once(";base64,").ok_or_else(|| {
            RecipeGenError::InvalidRequest("data URL is not base64 encoded".into())
        })?;
        let mime_type = if mime_type.is_empty() {
            FALLBACK_MIME_TYPE
        } else {
            mime_type
        };
        Ok(Self::new(mime_type, data))
    }

    /// Returns the payload as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
