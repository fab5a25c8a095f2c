//! textmining-api - Public REST API for text-mining submissions
//!
//! This crate accepts text-mining jobs and serves their results with:
//! - Submission validation (idempotent per user and ft_id while pending)
//! - redb embedded document store for submissions, annotations and users
//! - One queue message per submitted file (local outbox or RabbitMQ)
//! - HTTP Basic authentication

pub mod api;
pub mod auth;
pub mod config;
pub mod europepmc;
pub mod queue;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod validator;

use std::sync::Arc;

use config::Config;
use europepmc::DocumentRegistry;
use queue::QueuePublisher;
use service::SubmissionService;
use storage::{Database, RedbStore, SubmissionStore};
use validator::SubmissionValidator;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub service: SubmissionService,
}

impl AppState {
    /// Wire the store, validator and service over an opened database.
    pub fn new(
        config: Config,
        db: Database,
        publisher: Arc<dyn QueuePublisher>,
        registry: Option<Arc<dyn DocumentRegistry>>,
    ) -> Self {
        let store: Arc<dyn SubmissionStore> =
            Arc::new(RedbStore::new(db.clone(), config.storage.transactional));

        let mut validator = SubmissionValidator::new(Arc::clone(&store));
        if let Some(registry) = registry {
            validator = validator.with_registry(registry);
        }

        let service = SubmissionService::new(store, publisher, validator, &config.queue);

        Self {
            config,
            db,
            service,
        }
    }
}
