//! The fixed set of images a user can pick from.

use crate::error::{RecipeGenError, Result};
use crate::image::types::ImageReference;

/// Prompt used when the user has not typed one.
pub const DEFAULT_PROMPT: &str = "Provide a recipe for these baked goods";

/// A non-empty, ordered list of selectable images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCatalog {
    images: Vec<ImageReference>,
}

impl ImageCatalog {
    /// Creates a catalog. Fails if `images` is empty.
    pub fn new(images: Vec<ImageReference>) -> Result<Self> {
        if images.is_empty() {
            return Err(RecipeGenError::InvalidRequest(
                "image catalog must contain at least one image".into(),
            ));
        }
        Ok(Self { images })
    }

    /// The bundled baked-goods samples.
    pub fn baked_goods() -> Self {
        let images = (1..=3)
            .filter_map(|n| {
                ImageReference::new(format!("assets/images/baked_goods_{n}.jpg"))
                    .ok()
                    .map(|image| image.with_label(format!("Baked Good {n}")))
            })
            .collect();
        Self { images }
    }

    /// Returns the default selection (the first entry).
    pub fn default_image(&self) -> &ImageReference {
        &self.images[0]
    }

    /// Looks up an entry by exact locator.
    pub fn get(&self, locator: &str) -> Option<&ImageReference> {
        self.images.iter().find(|image| image.locator() == locator)
    }

    /// Looks up an entry by locator, then case-insensitively by label.
    pub fn find(&self, key: &str) -> Option<&ImageReference> {
        self.get(key).or_else(|| {
            self.images.iter().find(|image| {
                image
                    .label()
                    .is_some_and(|label| label.eq_ignore_ascii_case(key))
            })
        })
    }

    /// Returns all entries in display order.
    pub fn images(&self) -> &[ImageReference] {
        &self.images
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self::baked_goods()
    }
}
