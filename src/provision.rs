// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Provisioning sequencer.
//!
//! The __provisioning sequencer__ applies a fixed catalogue of twelve
//! __steps__ to a freshly installed Debian system. Each step owns one area
//! of system configuration: the package set, the bootloader defaults, a
//! group of desktop keys, an installed theme asset, and so on.
//!
//! # Idempotent Steps
//!
//! Every step reads the current state of its area first, and only writes
//! what differs from the desired state. Running a step twice leaves the
//! system exactly as running it once. Edits to text files go through the
//! structured editors in [`shellvars`], [`keyfile`], and [`gvariant`], so a
//! missing token gets inserted into a value instead of the whole line being
//! rewritten.
//!
//! Steps do not depend on each other. The only link between them is the
//! staged asset tree produced by the collector. A step whose asset directory
//! is missing reports itself as skipped instead of failing.
//!
//! # Step Selection
//!
//! Steps are picked by position (`1` to `12`), by name, or with `all`. The
//! sequencer runs the selection in order and keeps going past a failed step,
//! so one broken area never blocks the rest. Nothing is rolled back; each
//! step's idempotency is what makes a rerun safe.
//!
//! # See Also
//!
//! 1. [`system`]
//! 2. [`steps`]
//! 3. [`preflight`]

pub mod gvariant;
pub mod keyfile;
pub mod menu;
pub mod preflight;
pub mod shellvars;
pub mod steps;
pub mod system;

use crate::{
    config::ProvisionSettings,
    provision::{
        gvariant::ParseError,
        system::{HostSystem, System, SystemError},
    },
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{error, info, instrument, warn};

/// Stable identifier of a provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Upgrade,
    Packages,
    Purge,
    Grub,
    Fonts,
    Wallpapers,
    Icons,
    Interface,
    Favorites,
    Keyboard,
    Account,
    Cleanup,
}

impl StepId {
    /// Full catalogue in run order.
    pub const ALL: [StepId; 12] = [
        Self::Upgrade,
        Self::Packages,
        Self::Purge,
        Self::Grub,
        Self::Fonts,
        Self::Wallpapers,
        Self::Icons,
        Self::Interface,
        Self::Favorites,
        Self::Keyboard,
        Self::Account,
        Self::Cleanup,
    ];

    /// One-based position in the catalogue.
    pub fn position(&self) -> usize {
        Self::ALL
            .iter()
            .position(|step| step == self)
            .map_or(0, |index| index + 1)
    }

    /// Step at one-based position.
    pub fn from_position(position: usize) -> Option<Self> {
        position
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    /// Symbolic name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Packages => "packages",
            Self::Purge => "purge",
            Self::Grub => "grub",
            Self::Fonts => "fonts",
            Self::Wallpapers => "wallpapers",
            Self::Icons => "icons",
            Self::Interface => "interface",
            Self::Favorites => "favorites",
            Self::Keyboard => "keyboard",
            Self::Account => "account",
            Self::Cleanup => "cleanup",
        }
    }

    /// Short description for listings and menus.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Upgrade => "Refresh package lists and upgrade the system",
            Self::Packages => "Install configured packages",
            Self::Purge => "Purge unwanted packages",
            Self::Grub => "Adjust bootloader timeout and kernel command line",
            Self::Fonts => "Install staged fonts system-wide",
            Self::Wallpapers => "Install staged wallpapers and set the background",
            Self::Icons => "Install and select icon theme",
            Self::Interface => "Apply desktop interface preferences",
            Self::Favorites => "Pin applications to the dock",
            Self::Keyboard => "Set keyboard layout options",
            Self::Account => "Set account avatar and session",
            Self::Cleanup => "Remove unused packages and clear package cache",
        }
    }
}

impl Display for StepId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.name())
    }
}

impl FromStr for StepId {
    type Err = SelectionError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let ident = data.trim();
        if let Ok(position) = ident.parse::<usize>() {
            return Self::from_position(position)
                .ok_or_else(|| SelectionError::Unknown(ident.to_string()));
        }

        Self::ALL
            .into_iter()
            .find(|step| step.name().eq_ignore_ascii_case(ident))
            .ok_or_else(|| SelectionError::Unknown(ident.to_string()))
    }
}

/// Ordered, duplicate-free list of steps to run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection(Vec<StepId>);

impl Selection {
    /// Select whole catalogue.
    pub fn all() -> Self {
        Self(StepId::ALL.to_vec())
    }

    /// Parse step identifiers.
    ///
    /// Accepts positions, case-insensitive names, and `all` or `a`.
    /// Duplicates keep their first position.
    ///
    /// # Errors
    ///
    /// - Return [`SelectionError::Unknown`] for the first identifier that
    ///   names no step. Nothing is selected in that case.
    pub fn parse(idents: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self, SelectionError> {
        let mut selection = Self::default();
        for ident in idents {
            let ident = ident.as_ref().trim();
            if ident.eq_ignore_ascii_case("all") || ident.eq_ignore_ascii_case("a") {
                StepId::ALL.into_iter().for_each(|step| selection.push(step));
            } else {
                selection.push(ident.parse()?);
            }
        }

        Ok(selection)
    }

    /// Append step unless already selected.
    pub fn push(&mut self, step: StepId) {
        if !self.0.contains(&step) {
            self.0.push(step);
        }
    }

    /// Check if no step is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected steps in run order.
    pub fn steps(&self) -> &[StepId] {
        &self.0
    }
}

/// What a step did to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// System state was changed.
    Applied,

    /// System already matched desired state.
    Unchanged,

    /// Step could not apply, e.g., its staged assets are missing.
    Skipped(String),
}

impl StepOutcome {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Applied
        } else {
            Self::Unchanged
        }
    }
}

impl Display for StepOutcome {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Applied => fmt.write_str("applied"),
            Self::Unchanged => fmt.write_str("unchanged"),
            Self::Skipped(reason) => write!(fmt, "skipped ({reason})"),
        }
    }
}

/// Result of each step in a run, in run order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<(StepId, Result<StepOutcome>)>,
}

impl RunReport {
    /// Steps that failed along with their errors.
    pub fn failed(&self) -> impl Iterator<Item = (StepId, &StepError)> + '_ {
        self.results
            .iter()
            .filter_map(|(step, result)| result.as_ref().err().map(|err| (*step, err)))
    }

    /// Check if every step succeeded.
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Sequencer over a system.
#[derive(Debug)]
pub struct Provisioner<S = HostSystem>
where
    S: System,
{
    pub(crate) system: S,
    pub(crate) settings: ProvisionSettings,
    pub(crate) assets: PathBuf,
    pub(crate) user: String,
}

impl<S> Provisioner<S>
where
    S: System,
{
    /// Construct new provisioner for target user.
    pub fn new(system: S, settings: ProvisionSettings, user: impl Into<String>) -> Self {
        let assets = settings.assets();
        Self {
            system,
            settings,
            assets,
            user: user.into(),
        }
    }

    /// Root of staged asset tree.
    pub fn assets(&self) -> &Path {
        &self.assets
    }

    /// Account whose desktop gets configured.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Run one step.
    ///
    /// # Errors
    ///
    /// - Return [`StepError`] if the step cannot reach its desired state.
    #[instrument(skip(self), level = "debug")]
    pub fn run_step(&self, step: StepId) -> Result<StepOutcome> {
        let system = &self.system;
        let settings = &self.settings;
        match step {
            StepId::Upgrade => steps::upgrade(system),
            StepId::Packages => steps::packages(system, &settings.packages),
            StepId::Purge => steps::purge(system, &settings.purge),
            StepId::Grub => steps::grub(system, &settings.grub),
            StepId::Fonts => steps::fonts(system, &self.assets, &settings.fonts),
            StepId::Wallpapers => steps::wallpapers(system, &self.assets, &settings.wallpaper),
            StepId::Icons => steps::icons(system, &self.assets, &settings.icons),
            StepId::Interface => steps::interface(system, &settings.interface),
            StepId::Favorites => steps::favorites(system, &settings.favorites),
            StepId::Keyboard => steps::keyboard(system, &settings.xkb_options),
            StepId::Account => steps::account(system, &self.user, &settings.account),
            StepId::Cleanup => steps::cleanup(system),
        }
    }

    /// Run selected steps in order.
    ///
    /// A failed step is logged and recorded, then the run moves on.
    pub fn run(&self, selection: &Selection) -> RunReport {
        let mut report = RunReport::default();
        let total = StepId::ALL.len();

        for step in selection.steps().iter().copied() {
            info!(
                "[{}/{total}] {step}: {}",
                step.position(),
                step.description()
            );

            let result = self.run_step(step);
            match &result {
                Ok(StepOutcome::Skipped(reason)) => warn!("{step} skipped: {reason}"),
                Ok(outcome) => info!("{step} {outcome}"),
                Err(err) => error!("{step} failed: {err}"),
            }
            report.results.push((step, result));
        }

        report
    }
}

/// Step failure types.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Host system access failed.
    #[error(transparent)]
    System(#[from] SystemError),

    /// Current desktop key value is not valid GVariant text.
    #[error(transparent)]
    Value(#[from] ParseError),
}

/// Step identifier errors.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Identifier names no step.
    #[error("unknown step {0:?}, expected 1-12, a step name, or \"all\"")]
    Unknown(String),
}

/// Friendly result alias :3
pub type Result<T, E = StepError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::system::fake::FakeSystem;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case(&["1"], &[StepId::Upgrade]; "position")]
    #[test_case(&["GRUB"], &[StepId::Grub]; "name ignoring case")]
    #[test_case(&["favorites", "9", "4"], &[StepId::Favorites, StepId::Grub]; "duplicates run once")]
    #[test_case(&["12", "all"], &[
        StepId::Cleanup, StepId::Upgrade, StepId::Packages, StepId::Purge, StepId::Grub,
        StepId::Fonts, StepId::Wallpapers, StepId::Icons, StepId::Interface,
        StepId::Favorites, StepId::Keyboard, StepId::Account,
    ]; "all after explicit step")]
    #[test]
    fn parse_selection(idents: &[&str], expect: &[StepId]) {
        let result = Selection::parse(idents).unwrap();
        pretty_assertions::assert_eq!(result.steps(), expect);
    }

    #[test_case("0"; "position zero")]
    #[test_case("13"; "position past end")]
    #[test_case("wallpaper"; "near miss name")]
    #[test]
    fn reject_unknown_identifier(ident: &str) {
        let result = Selection::parse(["1", ident]);
        pretty_assertions::assert_eq!(result, Err(SelectionError::Unknown(ident.to_string())));
    }

    #[test]
    fn positions_match_catalogue() {
        for (index, step) in StepId::ALL.iter().enumerate() {
            assert_eq!(step.position(), index + 1);
            assert_eq!(StepId::from_position(index + 1), Some(*step));
            assert_eq!(step.name().parse::<StepId>(), Ok(*step));
        }
    }

    #[test]
    fn failed_step_does_not_stop_run() {
        let system = FakeSystem::default()
            .fail("apt-get update")
            .key("org.gnome.desktop.input-sources", "xkb-options", "@as []");
        let mut settings = ProvisionSettings::default();
        settings.xkb_options = vec!["compose:ralt".into()];
        let provisioner = Provisioner::new(system, settings, "blah");

        let selection = Selection::parse(["upgrade", "keyboard"]).unwrap();
        let report = provisioner.run(&selection);

        assert!(!report.is_success());
        assert_eq!(
            report.failed().map(|(step, _)| step).collect::<Vec<_>>(),
            vec![StepId::Upgrade]
        );
        assert!(matches!(
            report.results[1],
            (StepId::Keyboard, Ok(StepOutcome::Applied))
        ));
        assert_eq!(
            provisioner
                .system
                .key_value("org.gnome.desktop.input-sources", "xkb-options"),
            Some("['compose:ralt']".into())
        );
    }
}
