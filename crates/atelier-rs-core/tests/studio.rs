//! Studio integration tests over memory and file adapters.

use atelier_rs_config::{AtelierConfig, CollectionConfig, GenerationConfig};
use atelier_rs_core::{CoreError, FileAdapterFactory, ImageRequest, Studio};
use atelier_rs_generation::{BatchEvent, GenerationError, Resolution};
use atelier_rs_store::{MemoryAdapter, PersistStatus, StoreError};
use atelier_rs_test_utils::{FixedGenerator, FlakyAdapter, ScriptedGenerator};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

type Slots = Arc<Mutex<HashMap<String, FlakyAdapter>>>;

/// Factory handing out one shared flaky adapter per collection name.
fn flaky_factory(slots: Slots) -> impl Fn(&str) -> Result<FlakyAdapter, StoreError> {
    move |name: &str| {
        let mut slots = slots.lock();
        Ok(slots.entry(name.to_string()).or_default().clone())
    }
}

fn memory_studio(config: AtelierConfig) -> (Studio<FlakyAdapter>, Slots) {
    let slots = Slots::default();
    let studio = Studio::open(config, &flaky_factory(slots.clone())).expect("studio");
    (studio, slots)
}

#[tokio::test(start_paused = true)]
async fn batch_saves_successes_and_reports_timeouts() {
    let generator = ScriptedGenerator::new()
        .delay("variation 1", Duration::from_secs(1))
        .delay("variation 2", Duration::from_secs(120))
        .delay("variation 3", Duration::from_secs(2));
    let (studio, _) = memory_studio(AtelierConfig::default());
    let studio = studio.with_generator(Arc::new(generator.clone()));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let request = ImageRequest::new("a portrait of a cat")
        .with_style("anime")
        .with_variations();
    let batch = studio
        .generate_batch(&request, Some(tx))
        .await
        .expect("batch");

    assert_eq!(batch.report.summary(), "3/4 succeeded");
    assert!(matches!(
        batch.report.outcomes[1].result,
        Err(GenerationError::Timeout(_))
    ));
    let saved: Vec<usize> = batch.saved.iter().map(|image| image.index).collect();
    assert_eq!(saved, vec![0, 2, 3]);
    assert!(batch.saved.iter().all(|image| image.is_durable()));

    let gallery = studio.gallery();
    assert_eq!(gallery.len(), 3);
    let newest = &gallery.list()[0];
    assert_eq!(newest.payload().prompt, "a portrait of a cat");
    assert_eq!(newest.payload().model_name, "Gemini 3 Pro Image");
    assert_eq!(newest.tags(), ["anime".to_string(), "portrait".to_string()]);
    drop(gallery);
    assert_eq!(studio.image_history().len(), 3);
    assert_eq!(studio.prompts().prompts(), vec!["a portrait of a cat"]);

    let mut finished = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let BatchEvent::Finished(outcome) = event {
            finished.push(outcome.index);
        }
    }
    assert_eq!(finished.len(), 4);
    assert_eq!(finished.last(), Some(&1));
}

#[tokio::test]
async fn invalid_requests_touch_nothing() {
    let (studio, slots) = memory_studio(AtelierConfig::default());
    let err = studio
        .generate_batch(&ImageRequest::new("cat"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoGenerator));

    let generator = ScriptedGenerator::new();
    let studio = studio.with_generator(Arc::new(generator.clone()));
    let err = studio
        .generate_batch(&ImageRequest::new("   "), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::InvalidInput(_))
    ));
    let err = studio
        .generate_batch(&ImageRequest::new("cat").with_count(0), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::InvalidInput(_))
    ));

    assert!(generator.seen().is_empty());
    assert!(studio.prompts().list().is_empty());
    let slots = slots.lock();
    assert_eq!(slots["gallery"].write_count(), 0);
}

#[tokio::test]
async fn generate_one_uses_composed_prompt_and_options() {
    let generator = ScriptedGenerator::new();
    let (studio, _) = memory_studio(AtelierConfig::default());
    let studio = studio.with_generator(Arc::new(generator.clone()));

    let request = ImageRequest::new("a castle")
        .with_style("sketch")
        .with_resolution(Resolution::Ultra)
        .with_model("gemini-2.5-flash-image-preview")
        .with_aspect_ratio("16:9")
        .with_param("seed", 7);
    let saved = studio.generate_one(&request).await.expect("image");

    assert_eq!(
        generator.seen(),
        vec![
            "a castle, pencil sketch, hand-drawn, artistic sketch, detailed line art, 4K ultra high resolution"
                .to_string()
        ]
    );
    let gallery = studio.gallery();
    let record = gallery.get(&saved.gallery_id).expect("saved");
    assert_eq!(record.payload().model_name, "Gemini 2.5 Flash Image");
    assert_eq!(record.payload().params["seed"], 7);
    drop(gallery);
    let history = studio.image_history();
    assert_eq!(history.list()[0].payload().aspect_ratio, "16:9");
}

#[tokio::test]
async fn generate_one_returns_the_item_error() {
    let generator = ScriptedGenerator::new().fail(
        "castle",
        GenerationError::Authentication("not signed in".to_string()),
    );
    let (studio, _) = memory_studio(AtelierConfig::default());
    let studio = studio.with_generator(Arc::new(generator));

    let err = studio
        .generate_one(&ImageRequest::new("castle"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::Authentication(_))
    ));
    assert!(studio.gallery().is_empty());
    assert_eq!(studio.prompts().prompts(), vec!["castle"]);
}

#[tokio::test]
async fn gallery_degrades_when_storage_is_full() {
    let config = AtelierConfig::builder()
        .gallery(CollectionConfig::new(20))
        .generation(GenerationConfig {
            batch_size: 15,
            ..GenerationConfig::default()
        })
        .build();
    let (studio, slots) = memory_studio(config);
    let studio = studio.with_generator(Arc::new(FixedGenerator::new("data:image/png;base64,AAAA")));

    studio
        .generate_batch(&ImageRequest::new("landscape"), None)
        .await
        .expect("batch");
    assert_eq!(studio.gallery().len(), 15);

    slots.lock()["gallery"].fail_next(1);
    let saved = studio
        .generate_one(&ImageRequest::new("landscape at dusk"))
        .await
        .expect("image");

    assert_eq!(
        saved.gallery_status,
        PersistStatus::Degraded { retained: 10 }
    );
    assert!(saved.is_durable());
    let gallery = studio.gallery();
    assert_eq!(gallery.len(), 10);
    assert_eq!(gallery.list()[0].id(), &saved.gallery_id);
}

#[test]
fn reopened_file_studio_sees_persisted_records() {
    let temp = tempdir().expect("tempdir");
    let factory = FileAdapterFactory::new(temp.path());

    {
        let studio: Studio<_> = Studio::open(AtelierConfig::default(), &factory).expect("studio");
        studio.prompts().record("a red fox");
        studio.conversations().create(Some("Ideas"));
    }

    let studio: Studio<_> = Studio::open(AtelierConfig::default(), &factory).expect("studio");
    assert_eq!(studio.prompts().prompts(), vec!["a red fox"]);
    let conversations = studio.conversations();
    assert_eq!(conversations.conversations().len(), 2);
    assert_eq!(conversations.conversations()[0].payload().title, "Ideas");
    drop(conversations);

    let stats = studio.stats();
    let names: Vec<&str> = stats.iter().map(|stat| stat.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["gallery", "image_history", "prompt_history", "conversations"]
    );
    assert!(stats[2].stored_bytes > 0);
    assert!(temp.path().join("prompt_history.json").exists());
}

#[test]
fn invalid_config_is_rejected_on_open() {
    let config = AtelierConfig::builder()
        .gallery(CollectionConfig::new(0))
        .build();
    let result = Studio::open(config, &|_: &str| Ok::<_, StoreError>(MemoryAdapter::new()));
    assert!(matches!(result, Err(CoreError::Config(_))));
}
