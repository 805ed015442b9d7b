//! lesson-media - media ingestion and storage for lesson content
//!
//! This crate accepts instructor uploads (images, slide decks, videos,
//! external links), compresses them best-effort, stores blobs through a
//! swappable backend (local filesystem, GCS), and catalogs them as ordered
//! presentation records in an embedded redb database. Deletion tears down
//! record and blob consistently and keeps display order gap-free.

pub mod api;
pub mod catalog;
pub mod compress;
pub mod config;
pub mod intake;
pub mod object_store;
pub mod pipeline;
pub mod testutil;

use std::sync::Arc;

use catalog::Database;
use config::Config;

/// Acting user recorded on created rows. Auth is handled upstream; until it
/// is wired through, this matches the original deployment's single instructor.
pub const ACTING_USER_ID: i64 = 1;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub object_store: Arc<dyn object_store::ObjectStore>,
}
