//! Shared test helpers for textmining-api router tests.

use std::sync::Arc;

use base64::Engine;

use crate::config::{Config, EuropePmcConfig, NodeConfig, QueueConfig, StorageConfig};
use crate::queue::OutboxPublisher;
use crate::storage::models::UserRecord;
use crate::storage::Database;
use crate::AppState;

/// Users created by `test_state`, as (username, password)
pub const TEST_USERS: [(&str, &str); 2] = [("alice", "alice-secret"), ("bob", "bob-secret")];

/// Create a test AppState with a temporary database, the outbox queue and
/// the users in `TEST_USERS`.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        europepmc: EuropePmcConfig::default(),
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        queue: QueueConfig::default(),
        storage: StorageConfig::default(),
        test_mode: true,
        bootstrap_users: Vec::new(),
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");

    for (username, password) in TEST_USERS {
        db.put_user(&UserRecord {
            username: username.to_string(),
            password_hash: bcrypt::hash(password, 4).expect("Failed to hash test password"),
        })
        .expect("Failed to create test user");
    }

    let publisher = Arc::new(OutboxPublisher::new(db.clone()));
    Arc::new(AppState::new(config, db, publisher, None))
}

/// `Authorization` header value for a user
pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
