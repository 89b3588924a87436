//! Session state and the single-flight generation pipeline.

use crate::error::{RecipeGenError, Result};
use crate::generation::{format_for_display, GenerationRequest, GenerationResult, GenerativeClient};
use crate::image::{
    Base64Encoder, DefaultImageFetcher, ImageCatalog, ImageEncoder, ImageFetcher, ImageReference,
    DEFAULT_PROMPT,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A point-in-time copy of the controller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Prompt sent with the next submission.
    pub prompt_text: String,
    /// Image sent with the next submission.
    pub selected_image: ImageReference,
    /// True while a generation is in flight.
    pub is_busy: bool,
    /// Output of the last finished generation (or an `Error: ...` line).
    pub last_output_text: String,
}

/// What a call to [`RecipeGenerationController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The pipeline ran to completion with this result.
    Completed(GenerationResult),
    /// Another generation was in flight; nothing happened.
    Ignored,
}

struct Session {
    prompt_text: String,
    selected_image: ImageReference,
    last_output_text: String,
}

/// Clears the busy flag on every exit path, including a dropped future.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builder for [`RecipeGenerationController`].
pub struct RecipeGenerationControllerBuilder {
    client: Arc<dyn GenerativeClient>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
    encoder: Option<Arc<dyn ImageEncoder>>,
    catalog: Option<ImageCatalog>,
    prompt: Option<String>,
}

impl RecipeGenerationControllerBuilder {
    /// Sets the image fetcher. Defaults to [`DefaultImageFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the image encoder. Defaults to [`Base64Encoder`].
    pub fn encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Sets the selectable images. Defaults to [`ImageCatalog::baked_goods`].
    pub fn catalog(mut self, catalog: ImageCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the initial prompt. Defaults to [`DEFAULT_PROMPT`].
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Builds the controller in the idle state with the first catalog image selected.
    pub fn build(self) -> RecipeGenerationController {
        let catalog = self.catalog.unwrap_or_default();
        let session = Session {
            prompt_text: self.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            selected_image: catalog.default_image().clone(),
            last_output_text: String::new(),
        };

        RecipeGenerationController {
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(DefaultImageFetcher::default())),
            encoder: self.encoder.unwrap_or_else(|| Arc::new(Base64Encoder::new())),
            client: self.client,
            catalog,
            busy: AtomicBool::new(false),
            session: Mutex::new(session),
        }
    }
}

/// Runs fetch → encode → generate for the selected image and prompt.
///
/// At most one generation runs at a time; the output text is only replaced
/// once a run has finished.
pub struct RecipeGenerationController {
    fetcher: Arc<dyn ImageFetcher>,
    encoder: Arc<dyn ImageEncoder>,
    client: Arc<dyn GenerativeClient>,
    catalog: ImageCatalog,
    busy: AtomicBool,
    session: Mutex<Session>,
}

impl RecipeGenerationController {
    /// Creates a builder around a shared generative client.
    pub fn builder(client: Arc<dyn GenerativeClient>) -> RecipeGenerationControllerBuilder {
        RecipeGenerationControllerBuilder {
            client,
            fetcher: None,
            encoder: None,
            catalog: None,
            prompt: None,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the selectable images.
    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    /// Returns true while a generation is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Replaces the prompt used by the next submission.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.session().prompt_text = prompt.into();
    }

    /// Selects a catalog image by locator or label.
    pub fn select_image(&self, key: &str) -> Result<()> {
        let image = self.catalog.find(key).cloned().ok_or_else(|| {
            RecipeGenError::InvalidRequest(format!("'{key}' is not in the image catalog"))
        })?;
        self.session().selected_image = image;
        Ok(())
    }

    /// Returns the raw output of the last finished generation.
    pub fn last_output(&self) -> String {
        self.session().last_output_text.clone()
    }

    /// Returns the last output with newlines rendered as `<br>`.
    pub fn formatted_output(&self) -> String {
        format_for_display(&self.session().last_output_text)
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> SessionState {
        let is_busy = self.is_busy();
        let session = self.session();
        SessionState {
            prompt_text: session.prompt_text.clone(),
            selected_image: session.selected_image.clone(),
            is_busy,
            last_output_text: session.last_output_text.clone(),
        }
    }

    /// Runs one generation for the current selection and prompt.
    ///
    /// Returns [`SubmitOutcome::Ignored`] without touching any state if a
    /// generation is already running. Failures never propagate: they are
    /// stored as `"Error: <message>"` and the controller returns to idle.
    pub async fn submit(&self) -> SubmitOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("submit ignored, generation already in flight");
            return SubmitOutcome::Ignored;
        }
        let _busy = BusyGuard(&self.busy);

        let (image, prompt) = {
            let session = self.session();
            (session.selected_image.clone(), session.prompt_text.clone())
        };

        let start = Instant::now();
        let result = GenerationResult::from(self.run_pipeline(&image, &prompt).await);
        match &result {
            GenerationResult::Success(text) => tracing::info!(
                locator = %image,
                model = self.client.model(),
                duration_ms = start.elapsed().as_millis() as u64,
                text_len = text.len(),
                "recipe generated"
            ),
            GenerationResult::Failure(message) => tracing::warn!(
                locator = %image,
                model = self.client.model(),
                "recipe generation failed: {message}"
            ),
        }

        self.session().last_output_text = result.display_text();
        SubmitOutcome::Completed(result)
    }

    async fn run_pipeline(&self, image: &ImageReference, prompt: &str) -> Result<String> {
        let raw = self.fetcher.fetch(image).await?;
        let encoded = self.encoder.encode(raw).await?;
        let request = GenerationRequest::new(encoded, prompt);
        self.client.generate(&request).await
    }
}
