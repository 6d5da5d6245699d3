//! Atelier composition root.
//!
//! [`Studio`] builds every bounded store from an [`atelier_rs_config::AtelierConfig`]
//! and an [`AdapterFactory`], and drives image batches and chat turns through
//! the generation boundary.

mod chat;
mod error;
mod studio;

pub use chat::{APOLOGY_PREFIX, ChatTurn};
pub use error::CoreError;
pub use studio::{
    AdapterFactory, CollectionStats, FileAdapterFactory, GALLERY, IMAGE_HISTORY, ImageRequest,
    SavedImage, Studio, StudioBatch,
};
