//! Service configuration
//!
//! All paths derive from the resolved root folder unless explicitly
//! overridden: the surrogate library lives under `<root>/surrogates` and the
//! database at `<root>/vmask.db`.

use std::path::PathBuf;

/// Default HTTP port for the anonymization service
pub const DEFAULT_PORT: u16 = 5840;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub root_folder: PathBuf,
    pub surrogates_root: PathBuf,
    pub db_path: PathBuf,
}

impl Config {
    /// Build a config from the resolved root folder plus optional overrides
    pub fn new(
        root_folder: PathBuf,
        port: u16,
        surrogates_root: Option<PathBuf>,
        db_path: Option<PathBuf>,
    ) -> Self {
        let surrogates_root = surrogates_root.unwrap_or_else(|| root_folder.join("surrogates"));
        let db_path = db_path.unwrap_or_else(|| root_folder.join("vmask.db"));
        Self {
            port,
            root_folder,
            surrogates_root,
            db_path,
        }
    }
}
