//! Retrieval of raw image bytes from bundled assets or URLs.

use crate::error::{RecipeGenError, Result};
use crate::image::types::{ImageFormat, ImageReference, RawImage, ReferenceKind};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Trait for image byte sources.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches the full content of the referenced image. Makes one attempt.
    async fn fetch(&self, reference: &ImageReference) -> Result<RawImage>;
}

/// Builder for [`DefaultImageFetcher`].
#[derive(Debug, Clone, Default)]
pub struct DefaultImageFetcherBuilder {
    asset_root: Option<PathBuf>,
    client: Option<reqwest::Client>,
}

impl DefaultImageFetcherBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory asset locators are resolved against.
    /// Defaults to the current directory.
    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Uses an existing HTTP client instead of creating one.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the fetcher.
    pub fn build(self) -> DefaultImageFetcher {
        DefaultImageFetcher {
            client: self.client.unwrap_or_default(),
            asset_root: self.asset_root.unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Fetches `http(s)://` locators over the network and everything else from disk.
#[derive(Debug, Clone)]
pub struct DefaultImageFetcher {
    client: reqwest::Client,
    asset_root: PathBuf,
}

impl DefaultImageFetcher {
    /// Creates a new `DefaultImageFetcherBuilder`.
    pub fn builder() -> DefaultImageFetcherBuilder {
        DefaultImageFetcherBuilder::new()
    }

    /// Returns the directory asset locators are resolved against.
    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    async fn fetch_remote(&self, url: &str) -> Result<RawImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RecipeGenError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecipeGenError::fetch(url, format!("HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|e| RecipeGenError::fetch(url, format!("incomplete body: {e}")))?;

        Ok(RawImage::new(data.to_vec(), content_type))
    }

    async fn fetch_asset(&self, locator: &str) -> Result<RawImage> {
        let relative = Path::new(locator);
        let escapes_root = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes_root {
            return Err(RecipeGenError::fetch(
                locator,
                "asset path must stay inside the asset root",
            ));
        }

        let path = self.asset_root.join(relative);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| RecipeGenError::fetch(locator, e))?;

        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .map(|f| f.mime_type().to_string());

        Ok(RawImage::new(data, content_type))
    }
}

impl Default for DefaultImageFetcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[async_trait]
impl ImageFetcher for DefaultImageFetcher {
    async fn fetch(&self, reference: &ImageReference) -> Result<RawImage> {
        let image = match reference.kind() {
            ReferenceKind::Remote => self.fetch_remote(reference.locator()).await?,
            ReferenceKind::Asset => self.fetch_asset(reference.locator()).await?,
        };
        tracing::debug!(
            locator = %reference,
            size = image.size(),
            content_type = ?image.content_type,
            "fetched image"
        );
        Ok(image)
    }
}
