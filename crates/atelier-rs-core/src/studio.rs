//! Studio composition root: stores, generator and chat client built from config.

use crate::error::CoreError;
use atelier_rs_config::AtelierConfig;
use atelier_rs_generation::{
    BatchEvent, BatchFanOut, BatchReport, ChatClient, GeneratedImage, GenerationError,
    GenerationOptions, ImageGenerator, Resolution, compose_prompt, validate_prompt,
};
use atelier_rs_store::{
    BoundedCollection, ConversationBook, FileAdapter, GalleryImage, ImageHistoryEntry,
    PersistStatus, PersistenceAdapter, PromptHistory, RecordId, StoreError,
};
use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

pub const GALLERY: &str = "gallery";
pub const IMAGE_HISTORY: &str = "image_history";

/// Builds the persistence adapter for a named collection.
pub trait AdapterFactory {
    type Adapter: PersistenceAdapter;

    fn adapter(&self, name: &str) -> Result<Self::Adapter, StoreError>;
}

impl<F, A> AdapterFactory for F
where
    F: Fn(&str) -> Result<A, StoreError>,
    A: PersistenceAdapter,
{
    type Adapter = A;

    fn adapter(&self, name: &str) -> Result<A, StoreError> {
        self(name)
    }
}

/// One JSON file per collection under a root directory.
#[derive(Debug, Clone)]
pub struct FileAdapterFactory {
    root: PathBuf,
}

impl FileAdapterFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AdapterFactory for FileAdapterFactory {
    type Adapter = FileAdapter;

    fn adapter(&self, name: &str) -> Result<FileAdapter, StoreError> {
        FileAdapter::new(&self.root, name)
    }
}

/// A text-to-image request as entered by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageRequest {
    /// Prompt before style composition.
    pub prompt: String,
    /// Style preset key.
    pub style: Option<String>,
    pub resolution: Option<Resolution>,
    /// Model id; the configured default when absent.
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
    /// Provider parameters, stored with each gallery image.
    pub params: Map<String, Value>,
    /// Items per batch; the configured batch size when absent.
    pub count: Option<usize>,
    /// Give each item a distinct `variation N` prompt.
    pub variations: bool,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_variations(mut self) -> Self {
        self.variations = true;
        self
    }
}

/// A generated image saved into the gallery and the image history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    /// Batch item index.
    pub index: usize,
    /// Gallery record id.
    pub gallery_id: RecordId,
    pub gallery_status: PersistStatus,
    pub history_status: PersistStatus,
}

impl SavedImage {
    /// Whether both writes reached storage.
    pub fn is_durable(&self) -> bool {
        self.gallery_status.is_durable() && self.history_status.is_durable()
    }
}

/// Batch report plus what was saved from it.
#[derive(Debug, Clone)]
pub struct StudioBatch {
    pub report: BatchReport,
    /// Saved images ordered by item index.
    pub saved: Vec<SavedImage>,
}

/// Record counts and stored bytes for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub name: String,
    pub records: usize,
    pub max_size: usize,
    pub stored_bytes: usize,
}

/// Owns every store of one studio instance.
///
/// Stores sit behind mutexes so that batch items finishing concurrently
/// record their results one at a time. Guards are never held across an
/// await point.
pub struct Studio<A: PersistenceAdapter> {
    pub(crate) config: AtelierConfig,
    pub(crate) gallery: Mutex<BoundedCollection<GalleryImage, A>>,
    pub(crate) image_history: Mutex<BoundedCollection<ImageHistoryEntry, A>>,
    pub(crate) prompts: Mutex<PromptHistory<A>>,
    pub(crate) conversations: Mutex<ConversationBook<A>>,
    pub(crate) generator: Option<Arc<dyn ImageGenerator>>,
    pub(crate) chat: Option<Arc<dyn ChatClient>>,
}

impl Studio<FileAdapter> {
    /// Open file-backed stores under the configured storage root.
    ///
    /// A relative root resolves against the current directory.
    pub fn open_dir(config: AtelierConfig) -> Result<Self, CoreError> {
        let root = config.storage_root(std::env::current_dir()?);
        info!("opening studio storage (root={})", root.display());
        Self::open(config, &FileAdapterFactory::new(root))
    }
}

impl<A: PersistenceAdapter> Studio<A> {
    /// Validate the config and load every collection from `factory`.
    pub fn open<F>(config: AtelierConfig, factory: &F) -> Result<Self, CoreError>
    where
        F: AdapterFactory<Adapter = A>,
    {
        config.validate()?;
        let gallery = BoundedCollection::initialize(
            GALLERY,
            factory.adapter(GALLERY)?,
            config.gallery.options(),
        );
        let image_history = BoundedCollection::initialize(
            IMAGE_HISTORY,
            factory.adapter(IMAGE_HISTORY)?,
            config.image_history.options(),
        );
        let prompts = PromptHistory::initialize(
            factory.adapter(PromptHistory::<A>::NAME)?,
            config.prompt_history.options(),
        );
        let conversations = ConversationBook::open(
            factory.adapter(ConversationBook::<A>::NAME)?,
            config.conversations.options(),
        );
        info!(
            "studio opened (gallery={}, image_history={}, prompts={}, conversations={})",
            gallery.len(),
            image_history.len(),
            prompts.list().len(),
            conversations.conversations().len()
        );
        Ok(Self {
            config,
            gallery: Mutex::new(gallery),
            image_history: Mutex::new(image_history),
            prompts: Mutex::new(prompts),
            conversations: Mutex::new(conversations),
            generator: None,
            chat: None,
        })
    }

    /// Attach the image generation service.
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Attach the chat service.
    pub fn with_chat_client(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn config(&self) -> &AtelierConfig {
        &self.config
    }

    pub fn gallery(&self) -> MutexGuard<'_, BoundedCollection<GalleryImage, A>> {
        self.gallery.lock()
    }

    pub fn image_history(&self) -> MutexGuard<'_, BoundedCollection<ImageHistoryEntry, A>> {
        self.image_history.lock()
    }

    pub fn prompts(&self) -> MutexGuard<'_, PromptHistory<A>> {
        self.prompts.lock()
    }

    pub fn conversations(&self) -> MutexGuard<'_, ConversationBook<A>> {
        self.conversations.lock()
    }

    /// Counts and stored sizes of every collection.
    pub fn stats(&self) -> Vec<CollectionStats> {
        fn stats_of<P, A>(collection: &BoundedCollection<P, A>) -> CollectionStats
        where
            P: atelier_rs_store::Payload,
            A: PersistenceAdapter,
        {
            CollectionStats {
                name: collection.name().to_string(),
                records: collection.len(),
                max_size: collection.max_size(),
                stored_bytes: collection.stored_size(),
            }
        }

        vec![
            stats_of(&*self.gallery.lock()),
            stats_of(&*self.image_history.lock()),
            stats_of(self.prompts.lock().collection()),
            stats_of(self.conversations.lock().collection()),
        ]
    }

    /// Generate a batch of images and save every success as it arrives.
    ///
    /// The prompt is recorded in the prompt history once input is valid,
    /// whether or not any item succeeds. `events` receives a `Started` event
    /// per item followed by `Finished` events in completion order.
    pub async fn generate_batch(
        &self,
        request: &ImageRequest,
        events: Option<UnboundedSender<BatchEvent>>,
    ) -> Result<StudioBatch, CoreError> {
        let generator = self.generator.clone().ok_or(CoreError::NoGenerator)?;
        let base = validate_prompt(&request.prompt)?.to_string();
        let composed = compose_prompt(&base, request.style.as_deref(), request.resolution)?;
        let count = request.count.unwrap_or(self.config.generation.batch_size);
        if count == 0 {
            return Err(
                GenerationError::InvalidInput("batch size must be at least 1".to_string()).into(),
            );
        }
        let options = self.generation_options(request);
        let fan_out = BatchFanOut::new(count, self.config.generation.item_timeout())
            .with_variations(request.variations);

        let status = self.prompts.lock().record(&base);
        debug!("recorded prompt (status={:?})", status);

        if let Some(events) = &events {
            for index in 0..count {
                let _ = events.send(BatchEvent::Started {
                    index,
                    total: count,
                });
            }
        }

        let mut saved = Vec::new();
        let report = fan_out
            .run(generator, &composed, &options, |outcome| {
                if let Ok(image) = &outcome.result {
                    saved.push(self.save_image(outcome.index, image, &base, request, &options));
                }
                if let Some(events) = &events {
                    let _ = events.send(BatchEvent::Finished(outcome.clone()));
                }
            })
            .await?;
        saved.sort_by_key(|image| image.index);

        if let Some(image) = saved.iter().find(|image| !image.is_durable()) {
            warn!(
                "generated image not fully persisted (index={}, gallery={:?}, history={:?})",
                image.index, image.gallery_status, image.history_status
            );
        }
        Ok(StudioBatch { report, saved })
    }

    /// Generate one image under the configured item timeout.
    pub async fn generate_one(&self, request: &ImageRequest) -> Result<SavedImage, CoreError> {
        let mut single = request.clone();
        single.count = Some(1);
        single.variations = false;
        let batch = self.generate_batch(&single, None).await?;
        if let Some(Err(err)) = batch.report.outcomes.into_iter().next().map(|item| item.result) {
            return Err(err.into());
        }
        batch.saved.into_iter().next().ok_or_else(|| {
            GenerationError::Provider("generation produced no image".to_string()).into()
        })
    }

    fn generation_options(&self, request: &ImageRequest) -> GenerationOptions {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.generation.default_model.clone());
        GenerationOptions {
            model,
            aspect_ratio: request.aspect_ratio.clone(),
            params: request.params.clone(),
        }
    }

    fn save_image(
        &self,
        index: usize,
        image: &GeneratedImage,
        prompt: &str,
        request: &ImageRequest,
        options: &GenerationOptions,
    ) -> SavedImage {
        let mut payload = GalleryImage::new(&image.image_data, prompt, &options.model);
        if let Some(style) = &request.style {
            payload = payload.with_style(style);
        }
        payload.params = request.params.clone();
        let gallery = self.gallery.lock().add(payload);

        let entry = ImageHistoryEntry::new(
            &image.image_data,
            prompt,
            &options.model,
            options.aspect_ratio.as_deref(),
        );
        let history = self.image_history.lock().add(entry);

        debug!(
            "saved generated image (index={}, id={})",
            index,
            gallery.record.id()
        );
        SavedImage {
            index,
            gallery_id: gallery.record.id().clone(),
            gallery_status: gallery.status,
            history_status: history.status,
        }
    }
}
