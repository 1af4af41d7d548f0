// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Precondition checks run before any provisioning step.
//!
//! Two things are verified up front:
//!
//! - `/etc/os-release` reports the expected distribution, and version when
//!   one is configured. A mismatch can be waved through by the operator.
//! - The target account is known to the system account database, local or
//!   not. There is no way around this one, since several steps write into
//!   that account's records.
//!
//! Each failure maps to its own process exit code through
//! [`PreconditionError::exit_code`].

use crate::{
    config::OsSettings,
    provision::{
        shellvars::ShellVars,
        system::{System, SystemError},
    },
};

use std::{env, path::Path};
use tracing::{debug, instrument, warn};

pub const OS_RELEASE: &str = "/etc/os-release";

/// Exit code when the operator declines to continue on an unexpected system.
pub const EXIT_UNSUPPORTED_SYSTEM: i32 = 2;

/// Exit code when the target account cannot be found.
pub const EXIT_ACCOUNT_MISSING: i32 = 3;

/// Identity of running operating system.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub version: Option<String>,
}

impl OsRelease {
    /// Read identity from `/etc/os-release`.
    ///
    /// A missing file yields an empty identity, which matches nothing.
    ///
    /// # Errors
    ///
    /// - Return [`PreconditionError::System`] if file cannot be read.
    pub fn read(system: &impl System) -> Result<Self> {
        let contents = system.read_file(Path::new(OS_RELEASE))?.unwrap_or_default();
        let vars = ShellVars::from(contents.as_str());

        Ok(Self {
            id: vars.get("ID").unwrap_or_default().to_string(),
            version: vars.get("VERSION_ID").map(Into::into),
        })
    }

    /// Check if identity satisfies expected settings.
    pub fn matches(&self, expected: &OsSettings) -> bool {
        self.id.eq_ignore_ascii_case(&expected.id)
            && expected
                .version
                .as_ref()
                .map_or(true, |version| self.version.as_ref() == Some(version))
    }
}

/// Verify running operating system identity.
///
/// # Errors
///
/// - Return [`PreconditionError::UnsupportedSystem`] on mismatch.
#[instrument(skip(system), level = "debug")]
pub fn check_os(system: &impl System, expected: &OsSettings) -> Result<()> {
    let found = OsRelease::read(system)?;
    debug!("running on {found:?}");

    if found.matches(expected) {
        return Ok(());
    }

    Err(PreconditionError::UnsupportedSystem {
        expected: describe(&expected.id, expected.version.as_deref()),
        found: describe(&found.id, found.version.as_deref()),
    })
}

/// Pick target account.
///
/// Prefer configured name, then the account that invoked sudo, then the
/// current account.
///
/// # Errors
///
/// - Return [`PreconditionError::UnknownUser`] if no name is available.
pub fn resolve_user(configured: Option<&str>) -> Result<String> {
    [
        configured.map(Into::into),
        env::var("SUDO_USER").ok(),
        env::var("USER").ok(),
    ]
    .into_iter()
    .flatten()
    .find(|user| !user.trim().is_empty())
    .ok_or(PreconditionError::UnknownUser)
}

/// Verify target account exists.
///
/// # Errors
///
/// - Return [`PreconditionError::AccountMissing`] if the account database
///   has no entry for the account.
/// - Return [`PreconditionError::System`] if the lookup itself fails.
#[instrument(skip(system), level = "debug")]
pub fn check_account(system: &impl System, user: &str) -> Result<()> {
    if !system.account_exists(user)? {
        return Err(PreconditionError::AccountMissing(user.into()));
    }

    Ok(())
}

/// Run all precondition checks.
///
/// An unexpected system is passed to `confirm`, which decides whether to
/// carry on anyway.
///
/// # Errors
///
/// - Return [`PreconditionError::UnsupportedSystem`] if system mismatches
///   and `confirm` declines.
/// - Return [`PreconditionError::AccountMissing`] if account is absent.
pub fn run(
    system: &impl System,
    expected: &OsSettings,
    user: &str,
    confirm: impl FnOnce(&PreconditionError) -> bool,
) -> Result<()> {
    match check_os(system, expected) {
        Ok(()) => {}
        Err(err @ PreconditionError::UnsupportedSystem { .. }) => {
            if !confirm(&err) {
                return Err(err);
            }
            warn!("{err}, continuing anyway");
        }
        Err(err) => return Err(err),
    }

    check_account(system, user)
}

fn describe(id: &str, version: Option<&str>) -> String {
    match (id, version) {
        ("", _) => "unknown system".into(),
        (id, Some(version)) => format!("{id} {version}"),
        (id, None) => id.into(),
    }
}

/// Precondition failure types.
#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    /// Operating system is not the expected one.
    #[error("expected {expected}, but running on {found}")]
    UnsupportedSystem { expected: String, found: String },

    /// Target account is unknown to the account database.
    #[error("account {0:?} does not exist")]
    AccountMissing(String),

    /// No target account could be determined.
    #[error("cannot determine target account, set it with --user")]
    UnknownUser,

    /// Host system access failed.
    #[error(transparent)]
    System(#[from] SystemError),
}

impl PreconditionError {
    /// Process exit code for failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedSystem { .. } => EXIT_UNSUPPORTED_SYSTEM,
            Self::AccountMissing(_) | Self::UnknownUser => EXIT_ACCOUNT_MISSING,
            Self::System(_) => 1,
        }
    }
}

/// Friendly result alias :3
type Result<T, E = PreconditionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::system::fake::FakeSystem;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    const TRIXIE: &str = indoc! {r#"
        PRETTY_NAME="Debian GNU/Linux 13 (trixie)"
        VERSION_ID="13"
        ID=debian
    "#};

    fn host() -> FakeSystem {
        FakeSystem::default()
            .file(OS_RELEASE, TRIXIE)
            .account("root")
            .account("blah")
    }

    #[test]
    fn expected_system_passes() -> anyhow::Result<()> {
        let expected = OsSettings {
            id: "debian".into(),
            version: Some("13".into()),
        };
        run(&host(), &expected, "blah", |_| panic!("should not ask"))?;

        Ok(())
    }

    #[test]
    fn declined_mismatch_exits_with_two() {
        let expected = OsSettings {
            id: "debian".into(),
            version: Some("12".into()),
        };
        let result = run(&host(), &expected, "blah", |_| false);

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "expected debian 12, but running on debian 13");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn confirmed_mismatch_continues() -> anyhow::Result<()> {
        let expected = OsSettings {
            id: "ubuntu".into(),
            version: None,
        };
        run(&host(), &expected, "blah", |_| true)?;

        Ok(())
    }

    #[test]
    fn missing_account_exits_with_three() {
        let result = run(&host(), &OsSettings::default(), "bla", |_| true);

        let err = result.unwrap_err();
        assert!(matches!(err, PreconditionError::AccountMissing(ref user) if user == "bla"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn account_outside_local_files_is_found() -> anyhow::Result<()> {
        let system = FakeSystem::default().account("directory-user");
        check_account(&system, "directory-user")?;
        assert!(system.read_file(Path::new("/etc/passwd"))?.is_none());

        Ok(())
    }

    #[test]
    fn missing_os_release_matches_nothing() {
        let system = FakeSystem::default().account("blah");
        let result = check_os(&system, &OsSettings::default());
        assert!(matches!(
            result,
            Err(PreconditionError::UnsupportedSystem { ref found, .. }) if found == "unknown system"
        ));
    }

    #[sealed_test(env = [("SUDO_USER", "blah"), ("USER", "root")])]
    fn sudo_user_preferred_over_user() {
        assert_eq!(resolve_user(None).unwrap(), "blah");
        assert_eq!(resolve_user(Some("other")).unwrap(), "other");
    }

    #[sealed_test(env = [("SUDO_USER", ""), ("USER", "")])]
    fn empty_user_is_unknown() {
        assert!(matches!(resolve_user(None), Err(PreconditionError::UnknownUser)));
    }
}
