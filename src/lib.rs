//! aurora-nexus - account sessions and a metadata-only file registry
//!
//! This crate provides two independent stores persisted over a string
//! key-value backend:
//! - A session/identity store: accounts with salted password digests,
//!   a single active session, role changes and account removal
//! - A file registry: upload metadata, sharing, download counts, filtered
//!   search and (filename, size) deduplication statistics
//! - A REST API exposing both, with role-gated access

pub mod api;
pub mod auth;
pub mod config;
pub mod registry;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod validation;

use config::Config;
use registry::FileRegistry;

use auth::SessionStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub files: FileRegistry,
    pub sessions: SessionStore,
}
