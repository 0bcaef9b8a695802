//! Service configuration.

use std::path::PathBuf;

use clap::Parser;
use storage::CacheSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "mapdrop-api")]
#[command(about = "Raster metadata and XYZ tile server")]
pub struct Args {
    /// Listen address
    #[arg(short, long, env = "MAPDROP_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Root directory holding the rasters
    #[arg(long, env = "MAPDROP_DATA")]
    pub data_dir: PathBuf,

    /// Redis URL for the shared metadata cache (in-process cache when absent)
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    pub worker_threads: Option<usize>,

    /// Key cached metadata by file size and mtime as well as path
    #[arg(long, env = "MAPDROP_FINGERPRINT_KEYS", default_value_t = false)]
    pub fingerprint_keys: bool,
}

/// Settings the metadata and tile service runs with.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub fingerprint_keys: bool,
    pub cache: CacheSettings,
}

impl ServiceConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            fingerprint_keys: false,
            cache: CacheSettings::default(),
        }
    }

    pub fn with_fingerprint_keys(mut self, enabled: bool) -> Self {
        self.fingerprint_keys = enabled;
        self
    }

    pub fn with_cache_settings(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    /// Check the data directory exists.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.data_dir.is_dir() {
            anyhow::bail!(
                "data directory {} does not exist or is not a directory",
                self.data_dir.display()
            );
        }
        Ok(())
    }
}

impl From<&Args> for ServiceConfig {
    fn from(args: &Args) -> Self {
        ServiceConfig::new(&args.data_dir).with_fingerprint_keys(args.fingerprint_keys)
    }
}
