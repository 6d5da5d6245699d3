//! Tests for layered configuration loading.

use super::*;
use crate::{CollectionConfig, ConversationsConfig, GenerationConfig};
use atelier_rs_store::IdStrategy;
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Verify that an empty config parses with every default.
#[test]
fn parse_minimal_config() {
    let config = AtelierConfig::load_from_str("{}").expect("config");
    assert_eq!(config, AtelierConfig::default());
    assert_eq!(config.gallery.max_size, 50);
    assert_eq!(config.image_history.max_size, 50);
    assert_eq!(config.prompt_history.max_size, 100);
    assert_eq!(config.conversations.max_conversations, 50);
    assert_eq!(config.conversations.max_messages, 100);
    assert_eq!(config.conversations.default_model, "gpt-5.1-chat");
    assert_eq!(config.generation.batch_size, 4);
    assert_eq!(config.generation.item_timeout(), Duration::from_secs(60));
}

/// Partial sections keep the defaults of the fields they omit.
#[test]
fn partial_section_keeps_defaults() {
    let json5 = r#"{
        // comments are allowed
        gallery: { max_size: 20, id_strategy: "timestamp" },
        generation: { item_timeout_secs: 30 },
    }"#;
    let config = AtelierConfig::load_from_str(json5).expect("config");
    assert_eq!(config.gallery.max_size, 20);
    assert_eq!(config.gallery.degrade_retain, 10);
    assert_eq!(config.gallery.id_strategy, IdStrategy::Timestamp);
    assert_eq!(config.prompt_history.max_size, 100);
    assert_eq!(config.generation.batch_size, 4);
    assert_eq!(config.generation.item_timeout_secs, 30);

    let options = config.gallery.options();
    assert_eq!(options.max_size, 20);
    assert_eq!(options.id_strategy, IdStrategy::Timestamp);
}

/// Reject unexpected top-level and nested config keys.
#[test]
fn rejects_unknown_keys() {
    let err = AtelierConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown field"));

    let err = AtelierConfig::load_from_str("{ gallery: { size: 3 } }").unwrap_err();
    assert!(format!("{err}").contains("unknown field"));
}

#[test]
fn validation_rejects_bad_sizes() {
    let cases = [
        ("{ gallery: { max_size: 0 } }", "gallery"),
        (
            "{ conversations: { max_conversations: 0 } }",
            "conversations",
        ),
        (
            "{ conversations: { max_messages: 0 } }",
            "conversations.max_messages",
        ),
        ("{ generation: { batch_size: 0 } }", "generation.batch_size"),
        (
            "{ generation: { item_timeout_secs: 0 } }",
            "generation.item_timeout_secs",
        ),
    ];
    for (json5, path) in cases {
        match AtelierConfig::load_from_str(json5) {
            Err(ConfigError::InvalidField { path: got, .. }) => assert_eq!(got, path),
            other => panic!("expected invalid field for {json5}, got {other:?}"),
        }
    }
}

/// Sizes below the default degrade retain are valid; retain is capped.
#[test]
fn small_max_size_caps_degrade_retain() {
    let config =
        AtelierConfig::load_from_str("{ prompt_history: { max_size: 5 } }").expect("config");
    assert_eq!(config.prompt_history.max_size, 5);
    assert_eq!(config.prompt_history.degrade_retain, 10);
    let options = config.prompt_history.options();
    assert_eq!(options.max_size, 5);
    assert_eq!(options.degrade_retain, 5);

    let config = AtelierConfig::builder()
        .gallery(CollectionConfig::new(5))
        .conversations(ConversationsConfig {
            max_conversations: 3,
            ..ConversationsConfig::default()
        })
        .build();
    config.validate().expect("valid");
    assert_eq!(config.gallery.options().degrade_retain, 5);
    assert_eq!(config.conversations.options().collection.degrade_retain, 3);
}

#[test]
fn builder_overrides_sections() {
    let config = AtelierConfig::builder()
        .storage_root("/var/lib/atelier")
        .gallery(CollectionConfig::new(5))
        .generation(GenerationConfig {
            batch_size: 2,
            ..GenerationConfig::default()
        })
        .build();
    assert_eq!(config.gallery.max_size, 5);
    assert_eq!(config.generation.batch_size, 2);
    assert_eq!(
        config.storage_root("/tmp"),
        PathBuf::from("/var/lib/atelier")
    );
    config.validate().expect("valid");
}

#[test]
fn relative_storage_root_resolves_against_base() {
    let config = AtelierConfig::load_from_str(r#"{ storage: { root: "data" } }"#).expect("config");
    assert_eq!(
        config.storage_root("/srv/studio"),
        PathBuf::from("/srv/studio/data")
    );
}

/// Ensure cwd config overrides user config and runtime overrides both.
#[test]
fn layered_config_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("project");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("home").join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE);
    write_json5(
        &user_config,
        "{ gallery: { max_size: 30 }, conversations: { default_model: \"user-model\" } }",
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ gallery: { max_size: 40, degrade_retain: 5 } }",
    );
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ gallery: { max_size: 45 } }");

    let mut options = LayeredConfigOptions::new(&cwd).with_runtime_path(&runtime_config);
    options.user_config_path = Some(user_config);

    let layered = AtelierConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.gallery.max_size, 45);
    assert_eq!(layered.config.gallery.degrade_retain, 5);
    assert_eq!(layered.config.conversations.default_model, "user-model");
    let sources: Vec<ConfigLayerSource> =
        layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime
        ]
    );
}

#[test]
fn missing_optional_layers_are_skipped() {
    let temp = TempDir::new().expect("tmp");
    let mut options = LayeredConfigOptions::new(temp.path());
    options.user_config_path = Some(temp.path().join("absent.json5"));

    let layered = AtelierConfig::load_layered_with_options(options).expect("layered");
    assert!(layered.layers.is_empty());
    assert_eq!(layered.config, AtelierConfig::default());
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let mut options =
        LayeredConfigOptions::new(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    options.user_config_path = None;

    let err = AtelierConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

/// An unknown key in one layer is reported with that layer's label.
#[test]
fn layer_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    write_json5(
        &temp.path().join(DEFAULT_CONFIG_FILE),
        "{ gallery: { colour: \"red\" } }",
    );
    let mut options = LayeredConfigOptions::new(temp.path());
    options.user_config_path = None;

    match AtelierConfig::load_layered_with_options(options) {
        Err(ConfigError::InvalidField { path, message }) => {
            assert!(path.starts_with("cwd("));
            assert!(message.contains("colour"));
        }
        other => panic!("expected layer error, got {other:?}"),
    }
}
