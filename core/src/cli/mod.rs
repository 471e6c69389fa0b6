pub mod report;

use crate::error::Result;
use crate::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use clap::{Parser, ValueEnum};
use log::info;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Database path that selects the volatile in-memory store
pub const MEMORY_DATABASE: &str = ":memory:";

/// Default upload limit in megabytes
pub const DEFAULT_MAX_UPLOAD_MB: usize = 16;

/// Command-line arguments for the pulmolens server
#[derive(Parser, Debug)]
#[command(name = "pulmolens")]
#[command(about = "Chest X-ray pneumonia screening server")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "PULMOLENS_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Path to the model weights (.mpk)
    #[arg(
        long,
        env = "PULMOLENS_MODEL",
        default_value = "ml_model/pneumonia_model.mpk"
    )]
    pub model: PathBuf,

    /// SQLite database file, or ":memory:" for a volatile store
    #[arg(long, env = "PULMOLENS_DATABASE", default_value = "pulmolens.sqlite")]
    pub database: PathBuf,

    /// Maximum upload size in megabytes
    #[arg(long, env = "PULMOLENS_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Fail predictions whose record cannot be stored
    #[arg(long, env = "PULMOLENS_STRICT_PERSISTENCE")]
    pub strict_persistence: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Initialises `env_logger`; `RUST_LOG` still applies on top of the level
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Opens the record store named by `database`
pub fn open_store(database: &Path) -> Result<Arc<dyn RecordStore>> {
    if database.as_os_str() == MEMORY_DATABASE {
        info!("Using in-memory record store");
        return Ok(Arc::new(MemoryRecordStore::new()));
    }
    info!("Using record store {}", database.display());
    Ok(Arc::new(SqliteRecordStore::open(database)?))
}
