use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub cloud: CloudConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub node: NodeConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
    pub worker: WorkerConfig,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

/// Where managed-service clients point. `Local` redirects every AWS client to the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Managed,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub region: String,
    /// Emulator endpoint, e.g. `http://localhost:4566`
    pub emulator_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Attempts to open the metadata database at startup before giving up
    pub connect_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// Publish an object-created notification to the queue after every put.
    /// Stands in for bucket event notifications when there is no managed bucket.
    pub emulate_notifications: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBackend {
    Local,
    Sqs,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    pub queue_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityBackend {
    Cognito,
    Local,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub provider: IdentityBackend,
    pub cognito_client_id: Option<String>,
    pub password_hash_iterations: u32,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub batch_size: usize,
    pub poll_interval_ms: u64,
    /// SQS long-poll wait
    pub wait_time_seconds: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            emulator_endpoint: "http://localhost:4566".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            bucket: "my-test-bucket".to_string(),
            local_storage_path: "./files".to_string(),
            emulate_notifications: true,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::Local,
            queue_url: None,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            provider: IdentityBackend::Local,
            cognito_client_id: None,
            password_hash_iterations: 100_000,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 1,
            poll_interval_ms: 1000,
            wait_time_seconds: 10,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "true" || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = match std::env::var("ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "local" => Environment::Local,
            _ => Environment::Managed,
        };

        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let emulator_host =
            std::env::var("LOCALSTACK_HOST").unwrap_or_else(|_| "localhost".to_string());
        let emulator_port = std::env::var("LOCALSTACK_PORT").unwrap_or_else(|_| "4566".to_string());
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Local,
        };

        let bucket =
            std::env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "my-test-bucket".to_string());
        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());
        let emulate_notifications = env_flag("EMULATE_BUCKET_NOTIFICATIONS")
            .unwrap_or(storage_backend == StorageBackend::Local);

        let queue_backend = match std::env::var("QUEUE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqs" => QueueBackend::Sqs,
            _ => QueueBackend::Local,
        };

        let emulator_endpoint = format!("http://{emulator_host}:{emulator_port}");
        let queue_url = std::env::var("SQS_QUEUE_URL").ok().or_else(|| {
            (environment == Environment::Local)
                .then(|| format!("{emulator_endpoint}/000000000000/my-queue"))
        });

        let identity_provider = match std::env::var("AUTH_PROVIDER")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "cognito" => IdentityBackend::Cognito,
            _ => IdentityBackend::Local,
        };

        let config = Config {
            environment,
            cloud: CloudConfig {
                region,
                emulator_endpoint,
            },
            database: DatabaseConfig {
                connect_attempts: env_parse("DB_CONNECT_ATTEMPTS").unwrap_or(5),
            },
            identity: IdentityConfig {
                provider: identity_provider,
                cognito_client_id: std::env::var("COGNITO_CLIENT_ID").ok(),
                password_hash_iterations: env_parse("PASSWORD_HASH_ITERATIONS")
                    .unwrap_or(100_000),
            },
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            queue: QueueConfig {
                backend: queue_backend,
                queue_url,
            },
            storage: StorageConfig {
                backend: storage_backend,
                bucket,
                local_storage_path,
                emulate_notifications,
            },
            worker: WorkerConfig {
                enabled: env_flag("WORKER_ENABLED").unwrap_or(true),
                batch_size: env_parse("WORKER_BATCH_SIZE").unwrap_or(1),
                poll_interval_ms: env_parse("WORKER_POLL_INTERVAL_MS").unwrap_or(1000),
                wait_time_seconds: env_parse("WORKER_WAIT_TIME_SECONDS").unwrap_or(10),
            },
            max_upload_size: env_parse("MAX_UPLOAD_SIZE").unwrap_or(10 * 1024 * 1024), // 10MB
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.bucket.is_empty() {
            return Err(ConfigError::ValidationError(
                "S3_BUCKET_NAME cannot be empty".to_string(),
            ));
        }

        if self.database.connect_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "DB_CONNECT_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if matches!(self.queue.backend, QueueBackend::Sqs) && self.queue.queue_url.is_none() {
            return Err(ConfigError::ValidationError(
                "SQS_QUEUE_URL is required when QUEUE_BACKEND=sqs".to_string(),
            ));
        }

        if matches!(self.identity.provider, IdentityBackend::Cognito)
            && self.identity.cognito_client_id.is_none()
        {
            return Err(ConfigError::ValidationError(
                "COGNITO_CLIENT_ID is required when AUTH_PROVIDER=cognito".to_string(),
            ));
        }

        if self.identity.password_hash_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "PASSWORD_HASH_ITERATIONS must be at least 1".to_string(),
            ));
        }

        if !(1..=10).contains(&self.worker.batch_size) {
            return Err(ConfigError::ValidationError(
                "WORKER_BATCH_SIZE must be between 1 and 10".to_string(),
            ));
        }

        if self.worker.wait_time_seconds > 20 {
            return Err(ConfigError::ValidationError(
                "WORKER_WAIT_TIME_SECONDS must not exceed 20".to_string(),
            ));
        }

        if self.storage.emulate_notifications && matches!(self.storage.backend, StorageBackend::S3)
        {
            tracing::warn!(
                "EMULATE_BUCKET_NOTIFICATIONS is enabled with the S3 backend. \
                 If the bucket also publishes notifications, every upload is processed twice."
            );
        }

        Ok(())
    }

    /// Endpoint override for AWS clients, set only when running against the emulator.
    pub fn aws_endpoint(&self) -> Option<&str> {
        match self.environment {
            Environment::Local => Some(self.cloud.emulator_endpoint.as_str()),
            Environment::Managed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            environment: Environment::Local,
            cloud: CloudConfig::default(),
            database: DatabaseConfig::default(),
            identity: IdentityConfig::default(),
            node: NodeConfig {
                bind_address: "127.0.0.1:0".to_string(),
                data_dir: "./data".to_string(),
            },
            queue: QueueConfig::default(),
            storage: StorageConfig::default(),
            worker: WorkerConfig::default(),
            max_upload_size: 1024,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_sqs_requires_queue_url() {
        let mut config = base_config();
        config.queue.backend = QueueBackend::Sqs;
        assert!(config.validate().is_err());

        config.queue.queue_url = Some("http://localhost:4566/000000000000/q".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = base_config();
        config.worker.batch_size = 0;
        assert!(config.validate().is_err());
        config.worker.batch_size = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_emulator_endpoint_only_in_local_env() {
        let mut config = base_config();
        assert_eq!(config.aws_endpoint(), Some("http://localhost:4566"));
        config.environment = Environment::Managed;
        assert_eq!(config.aws_endpoint(), None);
    }
}
