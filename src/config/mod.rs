use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::common::retry::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::error::PageKitError;
use crate::listeners::ListenerRegistry;
use crate::utils::crypto::{CryptoManager, DEFAULT_SUFFIX};
use crate::utils::storage::Storage;

const DEFAULT_CONFIG_FILE: &str = "pagekit.json";
const DEFAULT_REGISTRY_NAME: &str = "default";

/// Main configuration struct for pagekit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Where persistent ("local") storage lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file backing the local area; in-memory when unset
    #[serde(default = "default_local_path")]
    pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Suffix mixed into the raw key and IV before hashing
    #[serde(default = "default_suffix")]
    pub default_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Name attached to registry logs and snapshots
    #[serde(default = "default_registry_name")]
    pub name: String,
}

// Default functions
fn default_local_path() -> Option<PathBuf> {
    std::env::var("PAGEKIT_STORAGE_PATH")
        .ok()
        .filter(|val| !val.is_empty())
        .map(PathBuf::from)
}

fn default_max_retries() -> usize {
    std::env::var("PAGEKIT_MAX_RETRIES")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_MAX_RETRIES)
}

fn default_delay_ms() -> u64 {
    std::env::var("PAGEKIT_RETRY_DELAY_MS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_RETRY_DELAY.as_millis() as u64)
}

fn default_suffix() -> String {
    std::env::var("PAGEKIT_CRYPTO_SUFFIX").unwrap_or_else(|_| DEFAULT_SUFFIX.to_string())
}

fn default_registry_name() -> String {
    std::env::var("PAGEKIT_REGISTRY_NAME").unwrap_or_else(|_| DEFAULT_REGISTRY_NAME.to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: default_local_path(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            default_suffix: default_suffix(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_registry_name(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::fixed(config.max_retries, Duration::from_millis(config.delay_ms))
    }
}

impl Config {
    /// Open the storage described by the `storage` section
    pub fn open_storage(&self) -> Result<Storage> {
        match &self.storage.local_path {
            Some(path) => Storage::open(path)
                .with_context(|| format!("Failed to open local storage at {}", path.display())),
            None => Ok(Storage::in_memory()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn crypto_manager(&self, key: &str, iv: &str) -> CryptoManager {
        CryptoManager::new(key, iv, Some(&self.crypto.default_suffix))
    }

    pub fn listener_registry(&self) -> ListenerRegistry {
        ListenerRegistry::with_name(self.registry.name.clone())
    }
}

/// Holds the loaded configuration and writes changes back to disk
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<Config>>,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load from `PAGEKIT_CONFIG_PATH` or `pagekit.json`
    pub async fn new() -> Result<Self> {
        Self::with_path(get_config_path()).await
    }

    /// Load from an explicit path, creating the file with defaults if missing
    pub async fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = path.into();
        let config = load_or_create_config(&config_path).await?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a clone of the current configuration
    pub async fn get_config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Replace the configuration and persist it
    pub async fn update_config(&self, new_config: Config) -> Result<()> {
        let mut config = self.config.write().await;
        save_config(&self.config_path, &new_config).await?;
        *config = new_config;
        Ok(())
    }

    /// Replace just the retry section
    pub async fn update_retry(&self, retry: RetryConfig) -> Result<()> {
        let mut config = self.config.write().await;
        let mut next = config.clone();
        next.retry = retry;
        save_config(&self.config_path, &next).await?;
        *config = next;
        Ok(())
    }
}

/// Load the configuration from the default location
pub async fn load_config() -> Result<Config> {
    let config_manager = ConfigManager::new().await?;
    Ok(config_manager.get_config().await)
}

fn get_config_path() -> PathBuf {
    std::env::var("PAGEKIT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

async fn load_or_create_config(path: &Path) -> Result<Config> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        let default_config = Config::default();
        save_config(path, &default_config).await?;
        info!("Created default configuration at {}", path.display());
        return Ok(default_config);
    }

    let config_str = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read configuration at {}", path.display()))?;
    let config: Config = serde_json::from_str(&config_str)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    if config.registry.name.trim().is_empty() {
        return Err(PageKitError::config("registry.name", "must not be empty").into());
    }
    debug!("Loaded configuration from {}", path.display());

    Ok(config)
}

async fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)
        .await
        .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
    debug!("Saved configuration to {}", path.display());

    Ok(())
}
