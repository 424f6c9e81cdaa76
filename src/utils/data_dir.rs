//! Global data directory for logs and the default download location.
//!
//! Defaults to `~/.fetchdrop/` but can be overridden via `--data-dir`.
//! Initialized once at startup via `init()`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

const DIR_NAME: &str = ".fetchdrop";

/// Resolve the data directory without touching the global.
pub fn resolve(custom: Option<&Path>) -> PathBuf {
    match custom {
        Some(p) => p.to_path_buf(),
        None => dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(DIR_NAME),
    }
}

/// Initialize the global data directory. Later calls keep the first value.
pub fn init(custom: Option<&Path>) -> &'static Path {
    let dir = resolve(custom);
    if DATA_DIR.set(dir.clone()).is_err() {
        warn!(event = "data_dir_reinit", ignored = %dir.display());
    }
    get()
}

/// The global data directory, or the default one when `init()` was never
/// called.
pub fn get() -> &'static Path {
    DATA_DIR.get_or_init(|| resolve(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_path_wins() {
        let custom = Path::new("/tmp/fetchdrop-data");
        assert_eq!(resolve(Some(custom)), custom);
    }

    #[test]
    fn default_ends_with_dir_name() {
        assert!(resolve(None).ends_with(DIR_NAME));
    }
}
