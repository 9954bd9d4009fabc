//! Shared test helpers for in-crate router and worker tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{
    CloudConfig, Config, DatabaseConfig, Environment, IdentityConfig, NodeConfig, QueueConfig,
    StorageConfig, WorkerConfig,
};
use crate::identity::{AuthTokens, IdentityError, IdentityProvider, LocalIdentity, UserHandle};
use crate::object_store::{LocalStore, NotifyingStore, ObjectStore};
use crate::queue::{LocalQueue, Queue};
use crate::storage::Database;
use crate::AppState;

fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    Config {
        environment: Environment::Local,
        cloud: CloudConfig::default(),
        database: DatabaseConfig::default(),
        identity: IdentityConfig {
            password_hash_iterations: 1_000,
            ..IdentityConfig::default()
        },
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: temp_dir.path().join("data").to_string_lossy().to_string(),
        },
        queue: QueueConfig::default(),
        storage: StorageConfig {
            local_storage_path: temp_dir.path().join("files").to_string_lossy().to_string(),
            ..StorageConfig::default()
        },
        worker: WorkerConfig {
            batch_size: 10,
            ..WorkerConfig::default()
        },
        max_upload_size: 1024 * 1024, // 1MB for tests
    }
}

/// Create a test AppState with a temporary database, local object store and
/// local queue. Every put publishes a notification to the queue.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");
    let identity = LocalIdentity::new(db.clone(), config.identity.password_hash_iterations);
    build_state(config, db, Arc::new(identity))
}

/// Same as [`test_state`] with a caller-supplied identity provider.
pub fn test_state_with_identity<I>(temp_dir: &tempfile::TempDir, identity: I) -> Arc<AppState>
where
    I: IdentityProvider + 'static,
{
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");
    build_state(config, db, Arc::new(identity))
}

fn build_state(config: Config, db: Database, identity: Arc<dyn IdentityProvider>) -> Arc<AppState> {
    let queue: Arc<dyn Queue> = Arc::new(LocalQueue::new(db.clone()));
    let store = LocalStore::new(&config.storage.local_storage_path, &config.storage.bucket)
        .expect("Failed to create test object store");
    let object_store: Arc<dyn ObjectStore> =
        Arc::new(NotifyingStore::new(Arc::new(store), Arc::clone(&queue)));

    Arc::new(AppState {
        config,
        db,
        identity,
        object_store,
        queue,
    })
}

/// Identity provider that accepts the single token `valid` and counts lookups.
#[derive(Clone, Default)]
pub struct TestIdentity {
    lookups: Arc<AtomicUsize>,
}

impl TestIdentity {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for TestIdentity {
    async fn sign_up(&self, _: &str, _: &str, _: &str) -> Result<UserHandle, IdentityError> {
        Err(IdentityError::Backend("sign-up not supported".into()))
    }

    async fn confirm_sign_up(&self, _: &str, _: &str) -> Result<(), IdentityError> {
        Err(IdentityError::Backend("confirmation not supported".into()))
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<AuthTokens, IdentityError> {
        Err(IdentityError::Backend("sign-in not supported".into()))
    }

    async fn get_user(&self, access_token: &str) -> Result<UserHandle, IdentityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if access_token != "valid" {
            return Err(IdentityError::Unauthenticated("invalid token".into()));
        }
        Ok(UserHandle {
            id: "test-user".to_string(),
            username: "test".to_string(),
            email: None,
            confirmed: true,
        })
    }

    async fn sign_out(&self, _: &str) -> Result<(), IdentityError> {
        Ok(())
    }
}
