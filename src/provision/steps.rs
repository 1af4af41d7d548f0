// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Provisioning step catalogue.
//!
//! Each step is a function of desired state over a [`System`]. It inspects
//! the current state first and only touches what differs, reporting
//! [`StepOutcome::Unchanged`] when there was nothing to do.

use crate::{
    collect::Category,
    config::{AccountSettings, DesktopSetting, FontSettings, GrubSettings, IconSettings, WallpaperSettings},
    provision::{
        gvariant::{quote, unquote, StrList},
        keyfile::KeyFile,
        shellvars::ShellVars,
        system::{Invocation, System},
        Result, StepOutcome,
    },
};

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const GRUB_DEFAULTS: &str = "/etc/default/grub";
pub const ACCOUNTS_USERS_DIR: &str = "/var/lib/AccountsService/users";
pub const ACCOUNTS_ICONS_DIR: &str = "/var/lib/AccountsService/icons";

const BACKGROUND_SCHEMA: &str = "org.gnome.desktop.background";
const SCREENSAVER_SCHEMA: &str = "org.gnome.desktop.screensaver";
const INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
const SHELL_SCHEMA: &str = "org.gnome.shell";
const INPUT_SOURCES_SCHEMA: &str = "org.gnome.desktop.input-sources";

/// Refresh package lists, then upgrade when the simulation shows work.
#[instrument(skip_all, level = "debug")]
pub fn upgrade(system: &impl System) -> Result<StepOutcome> {
    system.run(&apt().arg("update"))?;

    let plan = system.query(&Invocation::new("apt-get").args(["-s", "full-upgrade"]))?;
    let pending = count_actions(&plan, &["Inst "]);
    if pending == 0 {
        info!("system is up to date");
        return Ok(StepOutcome::Unchanged);
    }

    info!("{pending} packages to upgrade");
    system.run(&apt().args(["full-upgrade", "-y"]))?;
    Ok(StepOutcome::Applied)
}

/// Install configured packages that are not installed yet.
#[instrument(skip_all, level = "debug")]
pub fn packages(system: &impl System, packages: &[String]) -> Result<StepOutcome> {
    let missing = packages
        .iter()
        .filter(|package| !is_installed(system, package))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return Ok(StepOutcome::Unchanged);
    }

    system.run(&apt().args(["install", "-y"]).args(missing))?;
    Ok(StepOutcome::Applied)
}

/// Purge configured packages that are installed.
#[instrument(skip_all, level = "debug")]
pub fn purge(system: &impl System, packages: &[String]) -> Result<StepOutcome> {
    let present = packages
        .iter()
        .filter(|package| is_installed(system, package))
        .collect::<Vec<_>>();
    if present.is_empty() {
        return Ok(StepOutcome::Unchanged);
    }

    system.run(&apt().args(["purge", "-y"]).args(present))?;
    Ok(StepOutcome::Applied)
}

/// Set bootloader timeout and kernel command line tokens.
#[instrument(skip_all, level = "debug")]
pub fn grub(system: &impl System, settings: &GrubSettings) -> Result<StepOutcome> {
    let path = Path::new(GRUB_DEFAULTS);
    let Some(contents) = system.read_file(path)? else {
        return Ok(StepOutcome::Skipped(format!("{GRUB_DEFAULTS} not found")));
    };

    let mut defaults = ShellVars::from(contents.as_str());
    if let Some(timeout) = settings.timeout {
        defaults.set("GRUB_TIMEOUT", timeout.to_string());
    }
    for token in &settings.cmdline {
        defaults.insert_token("GRUB_CMDLINE_LINUX_DEFAULT", token);
    }

    if !defaults.changed() {
        return Ok(StepOutcome::Unchanged);
    }

    system.write_file(path, &defaults.to_string())?;
    system.run(&Invocation::privileged("update-grub"))?;
    Ok(StepOutcome::Applied)
}

/// Install staged fonts system-wide.
///
/// Each staged font directory keeps its own subdirectory under the
/// destination, so cloud and system fonts with equal names never clash.
#[instrument(skip_all, level = "debug")]
pub fn fonts(system: &impl System, assets: &Path, settings: &FontSettings) -> Result<StepOutcome> {
    let root = assets.join("Fonts");
    if !system.exists(&root) {
        warn!("no staged fonts at {:?}", root.display());
        return Ok(StepOutcome::Skipped(format!("{} not found", root.display())));
    }

    let mut installed = 0;
    for category in [Category::CloudFonts, Category::SystemFonts] {
        let source = assets.join(category.destination());
        if !system.exists(&source) {
            debug!("no staged {category}");
            continue;
        }

        let target = match source.file_name() {
            Some(name) => settings.destination.as_path().join(name),
            None => settings.destination.as_path().to_path_buf(),
        };
        installed += install_missing(system, &source, &target, category)?.len();
    }

    if installed == 0 {
        return Ok(StepOutcome::Unchanged);
    }

    info!("installed {installed} fonts");
    system.run(&Invocation::privileged("fc-cache").arg("-f"))?;
    Ok(StepOutcome::Applied)
}

/// Install staged wallpapers and point the desktop background at them.
///
/// The light image is used for the default color scheme and the lock
/// screen, the dark image for the dark color scheme.
#[instrument(skip_all, level = "debug")]
pub fn wallpapers(
    system: &impl System,
    assets: &Path,
    settings: &WallpaperSettings,
) -> Result<StepOutcome> {
    let source = assets.join(Category::Wallpapers.destination());
    if !system.exists(&source) {
        warn!("no staged wallpapers at {:?}", source.display());
        return Ok(StepOutcome::Skipped(format!("{} not found", source.display())));
    }

    let target = settings.destination.as_path();
    let installed = install_missing(system, &source, target, Category::Wallpapers)?;
    let mut changed = !installed.is_empty();

    let names = system
        .list_dir(&source)?
        .into_iter()
        .filter(|path| Category::Wallpapers.accepts(path))
        .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .collect::<Vec<_>>();
    let (Some(first), Some(last)) = (names.first(), names.last()) else {
        return Ok(StepOutcome::Skipped("no staged wallpapers".into()));
    };

    let light = pick_image(&names, settings.light.as_deref(), first);
    let dark = pick_image(&names, settings.dark.as_deref(), last);
    let light_uri = file_uri(&target.join(light));
    let dark_uri = file_uri(&target.join(dark));

    changed |= ensure_string_key(system, BACKGROUND_SCHEMA, "picture-uri", &light_uri)?;
    changed |= ensure_string_key(system, BACKGROUND_SCHEMA, "picture-uri-dark", &dark_uri)?;
    changed |= ensure_string_key(system, SCREENSAVER_SCHEMA, "picture-uri", &light_uri)?;

    Ok(StepOutcome::from_changed(changed))
}

/// Install staged icon theme and select it.
#[instrument(skip_all, level = "debug")]
pub fn icons(system: &impl System, assets: &Path, settings: &IconSettings) -> Result<StepOutcome> {
    let Some(theme) = settings.theme.as_deref() else {
        return Ok(StepOutcome::Skipped("no icon theme configured".into()));
    };

    let source = assets.join("Icons").join(theme);
    if !system.exists(&source) {
        warn!("no staged icon theme at {:?}", source.display());
        return Ok(StepOutcome::Skipped(format!("{} not found", source.display())));
    }

    let mut changed = false;
    let target = settings.destination.as_path().join(theme);
    if !system.exists(&target) {
        system.install_tree(&source, &target)?;
        system.run(
            &Invocation::privileged("gtk-update-icon-cache")
                .args(["-f", "-t"])
                .arg(target.to_string_lossy()),
        )?;
        changed = true;
    }

    changed |= ensure_string_key(system, INTERFACE_SCHEMA, "icon-theme", theme)?;
    Ok(StepOutcome::from_changed(changed))
}

/// Apply plain desktop settings whose current value differs.
#[instrument(skip_all, level = "debug")]
pub fn interface(system: &impl System, settings: &[DesktopSetting]) -> Result<StepOutcome> {
    let mut changed = false;
    for setting in settings {
        let current = system.read_key(&setting.schema, &setting.key)?;
        if current.trim() == setting.value.trim() {
            debug!("{} {} already {current}", setting.schema, setting.key);
            continue;
        }

        system.write_key(&setting.schema, &setting.key, setting.value.trim())?;
        changed = true;
    }

    Ok(StepOutcome::from_changed(changed))
}

/// Pin desktop files to the dock, keeping existing order.
#[instrument(skip_all, level = "debug")]
pub fn favorites(system: &impl System, apps: &[String]) -> Result<StepOutcome> {
    extend_list_key(system, SHELL_SCHEMA, "favorite-apps", apps)
}

/// Add keyboard layout options.
#[instrument(skip_all, level = "debug")]
pub fn keyboard(system: &impl System, options: &[String]) -> Result<StepOutcome> {
    extend_list_key(system, INPUT_SOURCES_SCHEMA, "xkb-options", options)
}

/// Set avatar and default session in the user's AccountsService record.
#[instrument(skip(system, settings), level = "debug")]
pub fn account(system: &impl System, user: &str, settings: &AccountSettings) -> Result<StepOutcome> {
    if settings.icon.is_none() && settings.session.is_none() {
        return Ok(StepOutcome::Skipped("no account icon or session configured".into()));
    }

    let path = Path::new(ACCOUNTS_USERS_DIR).join(user);
    let mut record = system
        .read_file(&path)?
        .map(|contents| KeyFile::from(contents.as_str()))
        .unwrap_or_default();
    let mut changed = false;

    if let Some(icon) = &settings.icon {
        let target = Path::new(ACCOUNTS_ICONS_DIR).join(user);
        if !system.exists(icon.as_path()) {
            warn!("account icon {:?} not found", icon.as_path().display());
        } else {
            if !system.exists(&target) {
                system.install_file(icon.as_path(), &target)?;
                changed = true;
            }
            record.set("User", "Icon", target.to_string_lossy());
        }
    }

    if let Some(session) = &settings.session {
        record.set("User", "Session", session.as_str());
    }

    if record.changed() {
        system.write_file(&path, &record.to_string())?;
        changed = true;
    }

    Ok(StepOutcome::from_changed(changed))
}

/// Remove orphaned packages and clear the package cache.
#[instrument(skip_all, level = "debug")]
pub fn cleanup(system: &impl System) -> Result<StepOutcome> {
    let plan = system.query(&Invocation::new("apt-get").args(["-s", "autoremove", "--purge"]))?;
    let orphans = count_actions(&plan, &["Purg ", "Remv "]);

    if orphans > 0 {
        info!("{orphans} orphaned packages to remove");
        system.run(&apt().args(["autoremove", "--purge", "-y"]))?;
    }
    system.run(&apt().arg("clean"))?;

    Ok(StepOutcome::from_changed(orphans > 0))
}

fn apt() -> Invocation {
    Invocation::privileged("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}

fn count_actions(plan: &str, prefixes: &[&str]) -> usize {
    plan.lines()
        .filter(|line| prefixes.iter().any(|prefix| line.starts_with(prefix)))
        .count()
}

fn is_installed(system: &impl System, package: &str) -> bool {
    let probe = Invocation::new("dpkg-query").args(["-W", "-f=${Status}", package]);
    system
        .query(&probe)
        .is_ok_and(|status| status.trim().ends_with("install ok installed"))
}

// Install every accepted file of source directory into target directory,
// skipping names already present there.
fn install_missing(
    system: &impl System,
    source: &Path,
    target: &Path,
    category: Category,
) -> Result<Vec<PathBuf>> {
    let mut installed = Vec::new();
    for path in system.list_dir(source)? {
        if !category.accepts(&path) {
            continue;
        }

        let Some(name) = path.file_name() else {
            continue;
        };

        let destination = target.join(name);
        if system.exists(&destination) {
            continue;
        }

        system.install_file(&path, &destination)?;
        installed.push(destination);
    }

    Ok(installed)
}

fn pick_image<'a>(names: &'a [String], wanted: Option<&str>, fallback: &'a str) -> &'a str {
    match wanted {
        Some(wanted) => match names.iter().find(|name| name.as_str() == wanted) {
            Some(name) => name.as_str(),
            None => {
                warn!("wallpaper {wanted:?} not staged, using {fallback:?}");
                fallback
            }
        },
        None => fallback,
    }
}

fn ensure_string_key(system: &impl System, schema: &str, key: &str, value: &str) -> Result<bool> {
    let current = unquote(system.read_key(schema, key)?)?;
    if current == value {
        return Ok(false);
    }

    system.write_key(schema, key, &quote(value))?;
    Ok(true)
}

fn extend_list_key(
    system: &impl System,
    schema: &str,
    key: &str,
    items: &[String],
) -> Result<StepOutcome> {
    let mut list: StrList = system.read_key(schema, key)?.parse()?;
    list.insert_all(items.iter().map(String::as_str));
    if !list.changed() {
        return Ok(StepOutcome::Unchanged);
    }

    system.write_key(schema, key, &list.to_string())?;
    Ok(StepOutcome::Applied)
}

/// Percent-encode absolute path as `file://` URI.
pub fn file_uri(path: &Path) -> String {
    let mut uri = String::from("file://");
    for byte in path.to_string_lossy().bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                uri.push(byte as char)
            }
            _ => uri.push_str(&format!("%{byte:02X}")),
        }
    }

    uri
}
