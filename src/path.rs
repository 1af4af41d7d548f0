// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations for the configuration file, the collector's
//! Windows sources, and the staged asset tree.

use std::{env, path::PathBuf};

/// Determine default absolute path to configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/fitout/config.toml`. Does
/// not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("fitout").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Default directory the collector stages assets into.
///
/// Relative to the current working directory, so the staged tree lands next
/// to wherever the operator runs the collector from.
pub fn default_asset_root() -> PathBuf {
    PathBuf::from("assets")
}

/// Vendor cache of downloaded cloud fonts.
///
/// Lives at `%LOCALAPPDATA%\Microsoft\FontCache\4\CloudFonts`.
pub fn default_cloud_fonts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|path| {
        path.join("Microsoft")
            .join("FontCache")
            .join("4")
            .join("CloudFonts")
    })
}

/// System font directory, `%WINDIR%\Fonts`.
pub fn default_system_fonts_dir() -> PathBuf {
    windows_dir().join("Fonts")
}

/// Stock wallpaper directory, `%WINDIR%\Web`.
pub fn default_wallpapers_dir() -> PathBuf {
    windows_dir().join("Web")
}

fn windows_dir() -> PathBuf {
    env::var_os("WINDIR")
        .or_else(|| env::var_os("SystemRoot"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Windows"))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("XDG_CONFIG_HOME", "/home/blah/.config")])]
    fn config_file_follows_xdg() {
        let result = default_config_file().unwrap();
        assert_eq!(result, PathBuf::from("/home/blah/.config/fitout/config.toml"));
    }

    #[sealed_test(env = [("WINDIR", "/mnt/windows/Windows")])]
    fn windows_sources_follow_windir() {
        assert_eq!(
            default_system_fonts_dir(),
            PathBuf::from("/mnt/windows/Windows/Fonts")
        );
        assert_eq!(
            default_wallpapers_dir(),
            PathBuf::from("/mnt/windows/Windows/Web")
        );
    }
}
