//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Whop REST API base URL.
pub const DEFAULT_WHOP_API_BASE: &str = "https://api.whop.com/api/v1";

/// Commission credited per newly active membership, in minor currency units.
pub const DEFAULT_COMMISSION_AMOUNT: i64 = 250;

/// Default polling interval (5 minutes).
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Page size requested from the membership listing.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Paths to all CryptoMind data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            root,
        };
        std::fs::create_dir_all(&paths.db)?;
        Ok(paths)
    }
}

/// Connection settings for the Whop integration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhopSettings {
    /// API key. The integration is disabled when absent.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Owner company under which every admin's memberships are hosted.
    pub owner_company_id: Option<String>,
    /// Plan id recorded when a membership carries none.
    pub fallback_plan_id: Option<String>,
    pub api_base: String,
}

impl WhopSettings {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Tunables for the membership sync loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    pub interval_ms: u64,
    pub commission_amount: i64,
    pub page_size: u32,
    /// Start polling as soon as the server boots.
    pub autostart: bool,
}

impl SyncSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            commission_amount: DEFAULT_COMMISSION_AMOUNT,
            page_size: DEFAULT_PAGE_SIZE,
            autostart: true,
        }
    }
}

/// Top-level CryptoMind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoMindConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub whop: WhopSettings,
    pub sync: SyncSettings,
}

impl CryptoMindConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> std::io::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(5000);

        let whop = WhopSettings {
            api_key: var("WHOP_API_KEY"),
            owner_company_id: var("WHOP_COMPANY_ID"),
            fallback_plan_id: var("WHOP_PLAN_ID"),
            api_base: var("WHOP_API_BASE").unwrap_or_else(|| DEFAULT_WHOP_API_BASE.to_string()),
        };

        let defaults = SyncSettings::default();
        let sync = SyncSettings {
            interval_ms: var("MEMBERSHIP_SYNC_INTERVAL_MS")
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.interval_ms),
            commission_amount: var("COMMISSION_AMOUNT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.commission_amount),
            page_size: defaults.page_size,
            autostart: var("MEMBERSHIP_SYNC_AUTOSTART")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.autostart),
        };

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            whop,
            sync,
        })
    }
}
