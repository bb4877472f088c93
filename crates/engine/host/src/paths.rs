//! Install-directory and bootstrap path resolution

use crate::{HostError, HostOptions, Result};
use std::path::PathBuf;

/// File evaluated at startup, relative to the install directory
pub const BOOTSTRAP_FILE: &str = "init.lua";

/// Subdirectory of the install directory searched for modules
pub const SCRIPTS_DIR: &str = "scripts";

/// Trim one trailing separator from a configured install directory.
///
/// Empty input is a configuration error.
pub fn normalize_install_dir(dir: &str) -> Result<String> {
    let trimmed = dir
        .strip_suffix('\\')
        .or_else(|| dir.strip_suffix('/'))
        .unwrap_or(dir);

    if trimmed.is_empty() {
        return Err(HostError::PathConfig(
            "host install path is not configured".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// `<install>/init.lua`; does not check that the file exists
pub fn resolve_bootstrap_path(options: &dyn HostOptions) -> Result<PathBuf> {
    let dir = normalize_install_dir(&options.install_path())?;
    Ok(PathBuf::from(dir).join(BOOTSTRAP_FILE))
}
