//! Locating the editor's local levels file.

use std::env;
use std::path::PathBuf;

/// File holding the player's local (created) levels.
pub const SAVE_FILE_NAME: &str = "CCLocalLevels.dat";

/// Steam app id of the editor, used for the Proton prefix on Linux.
const STEAM_APP_ID: &str = "322170";

/// Default save file location for the current platform.
///
/// Returns `None` when the required environment variable is not set.
pub fn default_save_path() -> Option<PathBuf> {
    default_save_path_for(env::consts::OS, |key| env::var(key).ok())
}

/// Default save location for `os` (as in [`std::env::consts::OS`]), reading
/// environment variables through `var`.
pub fn default_save_path_for<F>(os: &str, var: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let dir = match os {
        "windows" => PathBuf::from(var("LOCALAPPDATA")?).join("GeometryDash"),
        "macos" => PathBuf::from(var("HOME")?)
            .join("Library")
            .join("Application Support")
            .join("GeometryDash"),
        _ => PathBuf::from(var("HOME")?)
            .join(".local/share/Steam/steamapps/compatdata")
            .join(STEAM_APP_ID)
            .join("pfx/drive_c/users/steamuser/AppData/Local/GeometryDash"),
    };
    Some(dir.join(SAVE_FILE_NAME))
}
