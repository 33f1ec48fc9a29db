//! Core data types for the Keepsake media gallery.
//!
//! This crate provides the media model shared by the gallery components and the
//! download proxy, the deployment environment flag, layered configuration, and
//! object-storage URL resolution.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod environment;
mod media;
mod storage;

pub use config::{
    CollectorSettings, GallerySettings, KeepsakeConfig, ServerSettings, StorageSettings,
};
pub use environment::Environment;
pub use media::{MediaItem, MediaItemBuilder, MediaItemBuilderError, MediaType};
pub use storage::MediaUrlResolver;
