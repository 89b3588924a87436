//! Image acquisition and encoding.

mod catalog;
mod encoder;
mod fetcher;
mod types;

pub use catalog::{ImageCatalog, DEFAULT_PROMPT};
pub use encoder::{strip_data_uri_prefix, Base64Encoder, ImageEncoder};
pub use fetcher::{DefaultImageFetcher, DefaultImageFetcherBuilder, ImageFetcher};
pub use types::{
    EncodedImage, ImageFormat, ImageReference, RawImage, ReferenceKind, FALLBACK_MIME_TYPE,
};
