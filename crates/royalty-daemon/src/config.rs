//! Configuration file management.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use royalty_types::LedgerAddress;
use serde::{Deserialize, Serialize};

/// Complete daemon configuration, read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Cipher backend settings.
    #[serde(default)]
    pub cipher: CipherConfig,
    /// Service settings.
    #[serde(default)]
    pub daemon: ServiceConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Royalty contract address, `0x` + 40 hex characters.
    #[serde(default = "default_address")]
    pub address: String,
    /// Account the daemon submits from; owns the tracks it creates.
    #[serde(default = "default_address")]
    pub account: String,
}

/// Cipher configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CipherConfig {
    /// 32-byte key as hex. Empty = ephemeral key generated at startup.
    #[serde(default)]
    pub key_hex: String,
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Socket file name inside the data directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_address() -> String {
    LedgerAddress::ZERO.to_string()
}

fn default_socket_name() -> String {
    "royalty.sock".to_string()
}

fn default_event_buffer() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            account: default_address(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            socket_name: default_socket_name(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: DaemonConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.daemon.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.daemon.data_dir)
        }
    }

    /// Path of the JSON-RPC socket.
    pub fn socket_path(&self) -> PathBuf {
        self.data_dir().join(&self.daemon.socket_name)
    }

    /// Parsed contract address.
    pub fn ledger_address(&self) -> anyhow::Result<LedgerAddress> {
        self.ledger
            .address
            .parse()
            .with_context(|| format!("[ledger] address {:?}", self.ledger.address))
    }

    /// Parsed submitting account.
    pub fn account(&self) -> anyhow::Result<LedgerAddress> {
        self.ledger
            .account
            .parse()
            .with_context(|| format!("[ledger] account {:?}", self.ledger.account))
    }

    /// Configured cipher key, or `None` when an ephemeral key should be used.
    pub fn cipher_key(&self) -> anyhow::Result<Option<[u8; 32]>> {
        let key_hex = self.cipher.key_hex.trim();
        if key_hex.is_empty() {
            return Ok(None);
        }
        let bytes = hex::decode(key_hex.trim_start_matches("0x")).context("[cipher] key_hex")?;
        match <[u8; 32]>::try_from(bytes.as_slice()) {
            Ok(key) => Ok(Some(key)),
            Err(_) => bail!("[cipher] key_hex must be 32 bytes, got {}", bytes.len()),
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("ROYALTY_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Royalty")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".royalty")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/royalty"))
}
