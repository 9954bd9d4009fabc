//! file-pipeline - file upload with asynchronous content processing
//!
//! This crate provides:
//! - A JSON HTTP API for uploading files and reading them and their processing results
//! - Swappable object storage backends (local filesystem, S3)
//! - Durable notification queues (local redb-backed, SQS) feeding a processing worker
//! - User sign-up/sign-in with bearer tokens (self-contained or Cognito)
//! - redb embedded database for users, sessions, file metadata and results

pub mod api;
pub mod aws;
pub mod config;
pub mod identity;
pub mod object_store;
pub mod queue;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod worker;

use std::sync::Arc;

use config::Config;
use identity::IdentityProvider;
use queue::Queue;
use storage::Database;

/// Shared application state, built once at startup and handed to every component.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub object_store: Arc<dyn object_store::ObjectStore>,
    pub queue: Arc<dyn Queue>,
}
