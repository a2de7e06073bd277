//! XDG Base Directory paths for yiqu.
//!
//! The CLI keeps its config and saved assessment reports under XDG paths on every
//! platform, the same layout tools like gh and kubectl use.

use std::path::PathBuf;

const APP_DIR: &str = "yiqu";

/// Get the yiqu config directory.
///
/// Returns `$XDG_CONFIG_HOME/yiqu` if set, otherwise `~/.config/yiqu`.
///
/// # Examples
///
/// ```
/// use yiqu_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the yiqu data directory.
///
/// Returns `$XDG_DATA_HOME/yiqu` if set, otherwise `~/.local/share/yiqu`.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Directory where completed assessment reports are written.
pub fn reports_dir() -> PathBuf {
    data_dir().join("assessments")
}

fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    if let Ok(base) = std::env::var(env_var)
        && !base.is_empty()
    {
        PathBuf::from(base).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join(APP_DIR)
    } else {
        PathBuf::from(home_relative).join(APP_DIR)
    }
}
