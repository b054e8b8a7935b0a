use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMode {
    /// Markets, vaults and wallet positions.
    Full,
    /// Markets only.
    Lite,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    Json,
    Text,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(clap::Parser, Clone, Debug)]
#[command(name = "lendtop", version, about = "Terminal dashboard for lending markets and vaults")]
pub struct Config {
    #[clap(long, env = "LENDTOP_INDEXER_URL", help = "Base URL of the markets indexer")]
    pub indexer_url: String,

    #[clap(long, env = "LENDTOP_CHAIN_ID", default_value_t = 1)]
    pub chain_id: u64,

    #[clap(long, env = "LENDTOP_WALLET", help = "Wallet address whose positions are shown")]
    pub wallet: Option<String>,

    #[clap(long, env = "LENDTOP_MODE", value_enum, default_value_t = AppMode::Full)]
    pub mode: AppMode,

    #[clap(long, env = "LENDTOP_SEARCH_DEBOUNCE_MS", default_value_t = 300)]
    pub search_debounce_ms: u64,

    #[clap(long, env = "LENDTOP_SETTINGS_PATH")]
    pub settings_path: Option<PathBuf>,

    #[clap(long, env = "LENDTOP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[clap(long, env = "LENDTOP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[clap(long, env = "LENDTOP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn settings_path(&self) -> PathBuf {
        if let Some(path) = &self.settings_path {
            return path.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".config/lendtop/settings.json"),
            None => PathBuf::from("lendtop-settings.json"),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("lendtop.log"))
    }

    /// Positions need a wallet and are hidden in lite mode.
    pub fn positions_enabled(&self) -> bool {
        self.mode == AppMode::Full && self.wallet.is_some()
    }

    /// Logs go to a file: stdout belongs to the terminal UI.
    pub fn init_logging(&self) -> Result<()> {
        let path = self.log_path();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .context("Invalid log level")?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));
        match self.log_format {
            LogFormat::Text => subscriber.init(),
            LogFormat::Json => subscriber.json().flatten_event(true).init(),
        }
        Ok(())
    }
}
