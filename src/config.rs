// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the optional configuration file that overrides
//! collector source paths and the desired state the provisioning steps
//! converge on. Every field has a default, so an empty file, or no file at
//! all, is a valid configuration.
//!
//! # General Layout
//!
//! The file has two tables. `[collect]` names where the collector reads from
//! and where it stages assets. `[provision]` names the assets root the
//! provisioning steps read from, plus the packages, bootloader settings,
//! theme assets, and desktop keys they apply.
//!
//! Path fields go through shell expansion, so `~` and `$VAR` work.

use crate::{
    collect::Category,
    path::{
        default_asset_root, default_cloud_fonts_dir, default_system_fonts_dir,
        default_wallpapers_dir,
    },
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Complete configuration file layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    /// Asset collector settings.
    pub collect: CollectSettings,

    /// Provisioning step settings.
    pub provision: ProvisionSettings,
}

impl Configuration {
    /// Load configuration file.
    ///
    /// A missing file yields the default configuration, unless `required` is
    /// set, which is the case when the operator named the file explicitly.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists but cannot be read, or
    ///   is missing while required.
    /// - Return [`ConfigError::Deserialize`] if file content is invalid.
    pub fn load(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if !required && !path.exists() {
            return Ok(Self::default());
        }

        read_to_string(path)
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.to_path_buf(),
            })?
            .parse()
    }
}

impl FromStr for Configuration {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Configuration = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        let collect = &mut config.collect;
        for path in [
            &mut collect.destination,
            &mut collect.cloud_fonts,
            &mut collect.system_fonts,
            &mut collect.wallpapers,
        ]
        .into_iter()
        .flatten()
        {
            path.expand()?;
        }

        let provision = &mut config.provision;
        if let Some(assets) = provision.assets.as_mut() {
            assets.expand()?;
        }
        if let Some(icon) = provision.account.icon.as_mut() {
            icon.expand()?;
        }
        provision.fonts.destination.expand()?;
        provision.wallpaper.destination.expand()?;
        provision.icons.destination.expand()?;

        Ok(config)
    }
}

impl Display for Configuration {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Asset collector settings.
///
/// Unset source paths fall back to the stock Windows locations.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectSettings {
    /// Root of staged asset tree.
    pub destination: Option<ConfigPath>,

    /// Cloud font cache directory.
    pub cloud_fonts: Option<ConfigPath>,

    /// System font directory.
    pub system_fonts: Option<ConfigPath>,

    /// Stock wallpaper directory.
    pub wallpapers: Option<ConfigPath>,
}

impl CollectSettings {
    /// Root of staged asset tree, or default.
    pub fn destination(&self) -> PathBuf {
        self.destination
            .as_ref()
            .map(|path| path.as_path().to_path_buf())
            .unwrap_or_else(default_asset_root)
    }

    /// Source roots in collection order.
    ///
    /// Categories whose source cannot be determined at all are left out.
    pub fn sources(&self) -> Vec<(Category, PathBuf)> {
        let pick = |path: &Option<ConfigPath>| path.as_ref().map(|path| path.as_path().to_path_buf());

        let mut sources = Vec::new();
        if let Some(path) = pick(&self.cloud_fonts).or_else(default_cloud_fonts_dir) {
            sources.push((Category::CloudFonts, path));
        }
        sources.push((
            Category::SystemFonts,
            pick(&self.system_fonts).unwrap_or_else(default_system_fonts_dir),
        ));
        sources.push((
            Category::Wallpapers,
            pick(&self.wallpapers).unwrap_or_else(default_wallpapers_dir),
        ));

        sources
    }
}

/// Provisioning step settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisionSettings {
    /// Root of staged asset tree produced by the collector.
    pub assets: Option<ConfigPath>,

    /// Account whose desktop gets configured.
    pub user: Option<String>,

    /// Packages that must be installed.
    pub packages: Vec<String>,

    /// Packages that must not be installed.
    pub purge: Vec<String>,

    /// Desktop-file ids pinned to the dock.
    pub favorites: Vec<String>,

    /// Keyboard layout options.
    pub xkb_options: Vec<String>,

    /// Expected operating system identity.
    pub os: OsSettings,

    /// Bootloader defaults.
    pub grub: GrubSettings,

    /// System-wide font installation.
    pub fonts: FontSettings,

    /// Desktop background installation.
    pub wallpaper: WallpaperSettings,

    /// Icon theme installation.
    pub icons: IconSettings,

    /// Account metadata record.
    pub account: AccountSettings,

    /// Plain desktop configuration keys.
    pub interface: Vec<DesktopSetting>,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            assets: None,
            user: None,
            packages: strings([
                "curl",
                "flatpak",
                "fonts-noto",
                "fonts-noto-color-emoji",
                "git",
                "gnome-shell-extension-dashtodock",
                "gnome-tweaks",
            ]),
            purge: strings(["gnome-games"]),
            favorites: strings([
                "firefox-esr.desktop",
                "org.gnome.Nautilus.desktop",
                "org.gnome.Terminal.desktop",
            ]),
            xkb_options: strings(["compose:ralt"]),
            os: OsSettings::default(),
            grub: GrubSettings::default(),
            fonts: FontSettings::default(),
            wallpaper: WallpaperSettings::default(),
            icons: IconSettings::default(),
            account: AccountSettings::default(),
            interface: vec![
                DesktopSetting::new("org.gnome.desktop.interface", "color-scheme", "'prefer-dark'"),
                DesktopSetting::new("org.gnome.desktop.interface", "clock-show-weekday", "true"),
                DesktopSetting::new(
                    "org.gnome.desktop.wm.preferences",
                    "button-layout",
                    "'appmenu:minimize,maximize,close'",
                ),
                DesktopSetting::new("org.gnome.desktop.peripherals.touchpad", "tap-to-click", "true"),
            ],
        }
    }
}

impl ProvisionSettings {
    /// Root of staged asset tree, or default.
    pub fn assets(&self) -> PathBuf {
        self.assets
            .as_ref()
            .map(|path| path.as_path().to_path_buf())
            .unwrap_or_else(default_asset_root)
    }
}

/// Expected operating system identity from `/etc/os-release`.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OsSettings {
    /// Value of `ID`.
    pub id: String,

    /// Value of `VERSION_ID`, any version when unset.
    pub version: Option<String>,
}

impl Default for OsSettings {
    fn default() -> Self {
        Self {
            id: "debian".into(),
            version: None,
        }
    }
}

/// Bootloader defaults in `/etc/default/grub`.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GrubSettings {
    /// Menu timeout in seconds.
    pub timeout: Option<u32>,

    /// Tokens that must appear in the default kernel command line.
    pub cmdline: Vec<String>,
}

impl Default for GrubSettings {
    fn default() -> Self {
        Self {
            timeout: Some(2),
            cmdline: strings(["quiet", "splash"]),
        }
    }
}

/// System-wide font installation.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FontSettings {
    /// Directory fonts get installed into.
    pub destination: ConfigPath,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            destination: ConfigPath::new("/usr/local/share/fonts/fitout"),
        }
    }
}

/// Desktop background installation.
///
/// When the named light or dark image is not among the staged wallpapers,
/// the first and last file in sorted order stand in. That pick is a
/// heuristic; nothing guarantees the stand-ins are actually light or dark.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WallpaperSettings {
    /// Directory wallpapers get installed into.
    pub destination: ConfigPath,

    /// File name of image used with the light color scheme.
    pub light: Option<String>,

    /// File name of image used with the dark color scheme.
    pub dark: Option<String>,
}

impl Default for WallpaperSettings {
    fn default() -> Self {
        Self {
            destination: ConfigPath::new("/usr/share/backgrounds/fitout"),
            light: Some("img0.jpg".into()),
            dark: Some("img19.jpg".into()),
        }
    }
}

/// Icon theme installation.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IconSettings {
    /// Name of theme directory under `<assets>/Icons`.
    pub theme: Option<String>,

    /// Directory icon themes get installed into.
    pub destination: ConfigPath,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            theme: None,
            destination: ConfigPath::new("/usr/share/icons"),
        }
    }
}

/// AccountsService record settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountSettings {
    /// Avatar image.
    pub icon: Option<ConfigPath>,

    /// Default session name.
    pub session: Option<String>,
}

/// One desktop configuration key.
///
/// The value is GVariant text, exactly as `gsettings get` prints it, e.g.,
/// `'prefer-dark'` with quotes for strings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DesktopSetting {
    pub schema: String,
    pub key: String,
    pub value: String,
}

impl DesktopSetting {
    /// Construct new desktop setting.
    pub fn new(schema: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Path field subject to shell expansion.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ConfigPath(PathBuf);

impl ConfigPath {
    /// Construct new configuration path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Treat configuration path as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }

    fn expand(&mut self) -> Result<()> {
        let expanded = shellexpand::full(self.to_string().as_str())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned();
        self.0 = PathBuf::from(expanded);

        Ok(())
    }
}

impl Display for ConfigPath {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.into_iter().map(Into::into).collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
