use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub europepmc: EuropePmcConfig,
    pub node: NodeConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    /// Accounts created at startup, as (username, bcrypt hash)
    pub bootstrap_users: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Commit multi-table writes in a single transaction
    pub transactional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueBackend {
    Outbox,
    RabbitMq,
}

#[derive(Clone)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    /// Exchange the submission messages are published to ("" is the default exchange)
    pub exchange: String,
    pub submissions_queue: String,
    /// RabbitMQ management API base URL (required when backend is rabbitmq)
    pub rabbitmq_api_url: Option<String>,
    pub rabbitmq_vhost: String,
    pub rabbitmq_username: String,
    pub rabbitmq_password: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct EuropePmcConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<i64>,
    /// Reject submissions whose ft_id Europe PMC does not know
    pub verify_ft_id: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            transactional: true,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::Outbox,
            exchange: String::new(),
            submissions_queue: "submissions".to_string(),
            rabbitmq_api_url: None,
            rabbitmq_vhost: "/".to_string(),
            rabbitmq_username: "guest".to_string(),
            rabbitmq_password: "guest".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl std::fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConfig")
            .field("backend", &self.backend)
            .field("exchange", &self.exchange)
            .field("submissions_queue", &self.submissions_queue)
            .field("rabbitmq_api_url", &self.rabbitmq_api_url)
            .field("rabbitmq_vhost", &self.rabbitmq_vhost)
            .field("rabbitmq_username", &self.rabbitmq_username)
            .field("rabbitmq_password", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Default for EuropePmcConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebi.ac.uk/europepmc/webservices/rest".to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 10000,
            proxy_host: None,
            proxy_port: None,
            verify_ft_id: false,
        }
    }
}

impl EuropePmcConfig {
    /// Proxy URL, if a usable proxy host and port are configured.
    /// A host of "NULL" (any case) means no proxy.
    pub fn proxy_url(&self) -> Option<String> {
        let host = self.proxy_host.as_deref()?.trim();
        let port = self.proxy_port?;
        if host.is_empty() || host.eq_ignore_ascii_case("NULL") || port <= 0 {
            return None;
        }
        Some(format!("http://{host}:{port}"))
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse `name:hash,name:hash`. Entries without a separator are skipped.
fn parse_bootstrap_users(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| entry.split_once(':'))
        .map(|(name, hash)| (name.trim().to_string(), hash.trim().to_string()))
        .filter(|(name, hash)| !name.is_empty() && !hash.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let test_mode = env_flag("TEST_MODE", false);

        let transactional = env_flag("STORE_TRANSACTIONAL", true);

        let queue_defaults = QueueConfig::default();
        let backend = match std::env::var("QUEUE_BACKEND")
            .unwrap_or_else(|_| "outbox".to_string())
            .to_lowercase()
            .as_str()
        {
            "rabbitmq" => QueueBackend::RabbitMq,
            _ => QueueBackend::Outbox,
        };

        let queue = QueueConfig {
            backend,
            exchange: std::env::var("QUEUE_EXCHANGE").unwrap_or(queue_defaults.exchange),
            submissions_queue: std::env::var("QUEUE_SUBMISSIONS")
                .unwrap_or(queue_defaults.submissions_queue),
            rabbitmq_api_url: std::env::var("RABBITMQ_API_URL").ok(),
            rabbitmq_vhost: std::env::var("RABBITMQ_VHOST").unwrap_or(queue_defaults.rabbitmq_vhost),
            rabbitmq_username: std::env::var("RABBITMQ_USERNAME")
                .unwrap_or(queue_defaults.rabbitmq_username),
            rabbitmq_password: std::env::var("RABBITMQ_PASSWORD")
                .unwrap_or(queue_defaults.rabbitmq_password),
            timeout_ms: env_number("QUEUE_TIMEOUT_MS", queue_defaults.timeout_ms),
        };

        let epmc_defaults = EuropePmcConfig::default();
        let europepmc = EuropePmcConfig {
            base_url: std::env::var("EUROPEPMC_BASE_URL").unwrap_or(epmc_defaults.base_url),
            connect_timeout_ms: env_number(
                "EUROPEPMC_CONNECT_TIMEOUT_MS",
                epmc_defaults.connect_timeout_ms,
            ),
            read_timeout_ms: env_number("EUROPEPMC_READ_TIMEOUT_MS", epmc_defaults.read_timeout_ms),
            proxy_host: std::env::var("HTTP_PROXY_HOST").ok(),
            proxy_port: std::env::var("HTTP_PROXY_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            verify_ft_id: env_flag("EUROPEPMC_VERIFY_FT_ID", false),
        };

        let bootstrap_users = std::env::var("BOOTSTRAP_USERS")
            .map(|raw| parse_bootstrap_users(&raw))
            .unwrap_or_default();

        let config = Config {
            europepmc,
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            queue,
            storage: StorageConfig { transactional },
            test_mode,
            bootstrap_users,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.submissions_queue.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "QUEUE_SUBMISSIONS cannot be empty".to_string(),
            ));
        }

        if self.queue.backend == QueueBackend::RabbitMq && self.queue.rabbitmq_api_url.is_none() {
            return Err(ConfigError::ValidationError(
                "RABBITMQ_API_URL is required when QUEUE_BACKEND=rabbitmq".to_string(),
            ));
        }

        if self.europepmc.verify_ft_id && self.europepmc.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "EUROPEPMC_BASE_URL is required when EUROPEPMC_VERIFY_FT_ID is set".to_string(),
            ));
        }

        if !self.storage.transactional {
            tracing::warn!(
                "STORE_TRANSACTIONAL is off. Deleting a submission and its annotations \
                 will not be atomic."
            );
        }

        Ok(())
    }
}
