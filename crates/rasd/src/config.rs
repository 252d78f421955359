//! CLI-side configuration: thin wrappers over `rasd-config` that honor
//! the global flags.

use std::path::PathBuf;
use std::sync::Arc;

use rasd_core::FileStorage;

pub use rasd_config::{Config, config_path, load_config, save_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the resolved configuration (defaults, file, environment).
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = load_config()?;
    tracing::debug!(
        path = %config_path().display(),
        data_dir = ?global.data_dir,
        "configuration loaded"
    );
    Ok(cfg)
}

/// Storage directory: `--data-dir`, then the config file, then the
/// platform data directory.
pub fn storage_dir(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global
        .data_dir
        .clone()
        .unwrap_or_else(|| cfg.storage_dir())
}

pub fn open_storage(global: &GlobalOpts, cfg: &Config) -> Arc<FileStorage> {
    let dir = storage_dir(global, cfg);
    tracing::debug!(dir = %dir.display(), "using file storage");
    Arc::new(FileStorage::new(dir))
}
