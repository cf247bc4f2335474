use thiserror::Error;

use crate::auth::MIN_REGISTER_PASSWORD_LENGTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub node: NodeConfig,
    pub storage: StorageConfig,
    /// Maximum accepted multipart upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Simulated network latency applied to every login attempt
    pub login_delay_ms: u64,
    /// Password given to the seed administrator when no accounts exist
    pub admin_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Redb,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding the redb file
    pub data_dir: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: 380,
            admin_password: "admin123".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Redb,
            data_dir: "./data".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "redb".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::Redb,
        };

        let defaults = AuthConfig::default();
        let login_delay_ms = std::env::var("LOGIN_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.login_delay_ms);
        let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let config = Config {
            auth: AuthConfig {
                login_delay_ms,
                admin_password,
            },
            node: NodeConfig { bind_address },
            storage: StorageConfig { backend, data_dir },
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Redb && self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty when STORAGE_BACKEND=redb".to_string(),
            ));
        }

        if self.auth.admin_password.chars().count() < MIN_REGISTER_PASSWORD_LENGTH {
            return Err(ConfigError::ValidationError(format!(
                "ADMIN_PASSWORD must be at least {MIN_REGISTER_PASSWORD_LENGTH} characters"
            )));
        }

        if self.storage.backend == StorageBackend::Memory {
            tracing::warn!("Memory storage backend selected. Accounts and files will not survive a restart.");
        }

        Ok(())
    }
}
