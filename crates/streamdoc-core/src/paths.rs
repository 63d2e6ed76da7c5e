use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STREAMDOC_DIR: &str = ".streamdoc";
pub const CONFIG_FILE: &str = "config.yaml";
pub const CONFIG_ENV: &str = "STREAMDOC_CONFIG";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(STREAMDOC_DIR).join(CONFIG_FILE)
}

/// `~/.streamdoc/config.yaml`, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    home::home_dir().map(|h| project_config_path(&h))
}

/// Walk upward from `start` looking for `.streamdoc/config.yaml`.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = project_config_path(d);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
