// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Access to the host system.
//!
//! Provisioning steps never touch processes, files, or the desktop
//! configuration store directly. They go through the [`System`] trait, which
//! keeps each step a plain function of desired state over an interface that
//! tests can replace with a fake.
//!
//! # Privilege Escalation
//!
//! Most steps mutate files owned by root, but desktop configuration keys
//! belong to a user session. So fitout normally runs as the operator, and
//! [`HostSystem`] escalates individual commands with `sudo` when they are
//! marked privileged. Running fitout as root disables escalation.
//!
//! # Desktop Account
//!
//! Desktop configuration keys are read and written as the target account.
//! When fitout runs as someone else, say root through `sudo fitout`, each
//! `gsettings` call is wrapped in `sudo -u <account>` and given its own
//! session bus through `dbus-run-session`.

use nix::{
    errno::Errno,
    unistd::{getuid, User},
};
use std::{
    ffi::OsStr,
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_dir, read_to_string},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use tracing::{debug, info, instrument, warn};

/// External program invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    privileged: bool,
}

impl Invocation {
    /// Construct new invocation run as the operator.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Construct new invocation run with escalated privileges.
    pub fn privileged(program: impl Into<String>) -> Self {
        Self {
            privileged: true,
            ..Self::new(program)
        }
    }

    /// Append argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append listing of arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set environment variable for the program.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Whether invocation needs escalated privileges.
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    // Full argument vector, escalation and environment included.
    fn argv(&self, escalate: &[String]) -> Vec<String> {
        let mut argv = Vec::new();
        if self.privileged {
            argv.extend(escalate.iter().cloned());
        }

        // INVARIANT: Route environment through env(1) so sudo keeps it.
        if !self.envs.is_empty() {
            argv.push("env".into());
            argv.extend(self.envs.iter().map(|(key, value)| format!("{key}={value}")));
        }

        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.program)?;
        for arg in &self.args {
            write!(fmt, " {arg}")?;
        }

        Ok(())
    }
}

/// Layer of indirection for host system access.
pub trait System {
    /// Run a read-only command and capture its standard output.
    fn query(&self, invocation: &Invocation) -> Result<String>;

    /// Run a command that changes system state, streaming its output.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Read desktop configuration key as GVariant text.
    fn read_key(&self, schema: &str, key: &str) -> Result<String>;

    /// Write desktop configuration key from GVariant text.
    fn write_key(&self, schema: &str, key: &str, value: &str) -> Result<()>;

    /// Read file content, or `None` when the file does not exist.
    fn read_file(&self, path: &Path) -> Result<Option<String>>;

    /// Replace file content with escalated privileges.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if account is known to the system account database.
    fn account_exists(&self, user: &str) -> Result<bool>;

    /// List directory entries in sorted order.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Copy one file into place with escalated privileges.
    ///
    /// Parent directories are created as needed.
    fn install_file(&self, source: &Path, destination: &Path) -> Result<()>;

    /// Copy a directory tree into place with escalated privileges.
    fn install_tree(&self, source: &Path, destination: &Path) -> Result<()>;
}

/// Host system access through external processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSystem {
    escalate: Vec<String>,
    desktop_user: Option<String>,
}

impl HostSystem {
    /// Construct new host system access with explicit escalation command.
    ///
    /// An empty escalation command runs privileged invocations as is.
    pub fn new(escalate: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            escalate: escalate.into_iter().map(Into::into).collect(),
            desktop_user: None,
        }
    }

    /// Construct new host system access, escalating through sudo unless
    /// already running as root.
    pub fn detect() -> Self {
        if getuid().is_root() {
            debug!("running as root, no privilege escalation");
            Self::new(Vec::<String>::new())
        } else {
            Self::new(["sudo"])
        }
    }

    /// Access desktop configuration keys as `user`.
    ///
    /// Keys go through the current process as is when `user` is the account
    /// fitout already runs as.
    pub fn acting_for(self, user: impl Into<String>) -> Self {
        let user = user.into();
        let current = match User::from_uid(getuid()) {
            Ok(account) => account.map(|account| account.name),
            Err(err) => {
                warn!("cannot look up current account: {err}");
                None
            }
        };

        if current.as_deref() == Some(user.as_str()) {
            return self.with_desktop_user(None);
        }

        debug!("desktop keys accessed as {user:?}");
        self.with_desktop_user(Some(user))
    }

    /// Set account desktop configuration keys are accessed as.
    ///
    /// With `None` keys belong to whoever runs fitout.
    pub fn with_desktop_user(mut self, user: Option<String>) -> Self {
        self.desktop_user = user;
        self
    }

    fn split(&self, invocation: &Invocation) -> (String, Vec<String>) {
        let mut argv = invocation.argv(&self.escalate);
        let program = argv.remove(0);
        (program, argv)
    }

    fn gsettings(&self, args: &[&str]) -> (String, Vec<String>) {
        let mut argv = Vec::new();
        if let Some(user) = &self.desktop_user {
            let wrapper = ["sudo", "-H", "-u", user.as_str(), "dbus-run-session", "--"];
            argv.extend(wrapper.map(String::from));
        }
        argv.push("gsettings".into());
        argv.extend(args.iter().map(|arg| arg.to_string()));

        let program = argv.remove(0);
        (program, argv)
    }
}

impl System for HostSystem {
    #[instrument(skip(self), level = "debug")]
    fn query(&self, invocation: &Invocation) -> Result<String> {
        let (program, args) = self.split(invocation);
        syscall_non_interactive(program, args)
    }

    #[instrument(skip(self), level = "debug")]
    fn run(&self, invocation: &Invocation) -> Result<()> {
        info!("run {invocation}");
        let (program, args) = self.split(invocation);
        syscall_interactive(program, args)
    }

    fn read_key(&self, schema: &str, key: &str) -> Result<String> {
        let (program, args) = self.gsettings(&["get", schema, key]);
        let output = syscall_non_interactive(program, args)?;
        Ok(output.trim().to_string())
    }

    fn write_key(&self, schema: &str, key: &str, value: &str) -> Result<()> {
        info!("set {schema} {key} to {value}");
        let (program, args) = self.gsettings(&["set", schema, key, value]);
        syscall_non_interactive(program, args)?;
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        match read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == ErrorKind::PermissionDenied && !self.escalate.is_empty() => {
                debug!("escalate to read {:?}", path.display());
                let probe = Invocation::privileged("test")
                    .arg("-e")
                    .arg(path.to_string_lossy());
                if self.query(&probe).is_err() {
                    return Ok(None);
                }

                let cat = Invocation::privileged("cat").arg(path.to_string_lossy());
                self.query(&cat).map(Some)
            }
            Err(err) => Err(SystemError::Io {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        info!("write {:?}", path.display());
        if let Some(parent) = path.parent() {
            let mkdir = Invocation::privileged("mkdir")
                .arg("-p")
                .arg(parent.to_string_lossy());
            self.query(&mkdir)?;
        }

        let tee = Invocation::privileged("tee").arg(path.to_string_lossy());
        let (program, args) = self.split(&tee);
        syscall_with_input(program, args, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn account_exists(&self, user: &str) -> Result<bool> {
        let account = User::from_name(user).map_err(|err| SystemError::Lookup {
            source: err,
            user: user.into(),
        })?;

        Ok(account.is_some())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let io_err = |err| SystemError::Io {
            source: err,
            path: path.to_path_buf(),
        };

        let mut entries = read_dir(path)
            .map_err(io_err)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(io_err)?;
        entries.sort();

        Ok(entries)
    }

    fn install_file(&self, source: &Path, destination: &Path) -> Result<()> {
        let install = Invocation::privileged("install")
            .args(["-D", "-m", "0644"])
            .arg(source.to_string_lossy())
            .arg(destination.to_string_lossy());
        debug!("{install}");
        self.query(&install)?;
        Ok(())
    }

    fn install_tree(&self, source: &Path, destination: &Path) -> Result<()> {
        let copy = Invocation::privileged("cp")
            .args(["-r", "--no-preserve=ownership"])
            .arg(source.to_string_lossy())
            .arg(destination.to_string_lossy());
        info!("run {copy}");
        self.query(&copy)?;
        Ok(())
    }
}

/// Dry run wrapper.
///
/// Reads go to the wrapped system so steps still see real state; writes are
/// logged and dropped.
#[derive(Debug, Clone)]
pub struct DryRun<S>
where
    S: System,
{
    inner: S,
}

impl<S> DryRun<S>
where
    S: System,
{
    /// Construct new dry run wrapper.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> System for DryRun<S>
where
    S: System,
{
    fn query(&self, invocation: &Invocation) -> Result<String> {
        self.inner.query(invocation)
    }

    fn run(&self, invocation: &Invocation) -> Result<()> {
        info!("would run {invocation}");
        Ok(())
    }

    fn read_key(&self, schema: &str, key: &str) -> Result<String> {
        self.inner.read_key(schema, key)
    }

    fn write_key(&self, schema: &str, key: &str, value: &str) -> Result<()> {
        info!("would set {schema} {key} to {value}");
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        info!("would write {:?}:\n{contents}", path.display());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn account_exists(&self, user: &str) -> Result<bool> {
        self.inner.account_exists(user)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.inner.list_dir(path)
    }

    fn install_file(&self, source: &Path, destination: &Path) -> Result<()> {
        info!(
            "would install {:?} to {:?}",
            source.display(),
            destination.display()
        );
        Ok(())
    }

    fn install_tree(&self, source: &Path, destination: &Path) -> Result<()> {
        info!(
            "would install tree {:?} to {:?}",
            source.display(),
            destination.display()
        );
        Ok(())
    }
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let command = describe(cmd.as_ref());
    let status = Command::new(cmd.as_ref())
        .args(args)
        .spawn()
        .map_err(|err| SystemError::Spawn {
            source: err,
            command: command.clone(),
        })?
        .wait()
        .map_err(|err| SystemError::Spawn {
            source: err,
            command: command.clone(),
        })?;

    if !status.success() {
        return Err(SystemError::Failed {
            command,
            message: status.to_string(),
        });
    }

    Ok(())
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let command = describe(cmd.as_ref());
    let output = Command::new(cmd.as_ref())
        .args(args)
        .output()
        .map_err(|err| SystemError::Spawn {
            source: err,
            command: command.clone(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        // INVARIANT: Chomp trailing newlines.
        let message = stderr.trim_end().to_string();
        return Err(SystemError::Failed { command, message });
    }

    Ok(stdout)
}

fn syscall_with_input(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    input: &str,
) -> Result<()> {
    let command = describe(cmd.as_ref());
    let spawn_err = |err| SystemError::Spawn {
        source: err,
        command: command.clone(),
    };

    let mut child = Command::new(cmd.as_ref())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).map_err(spawn_err)?;
    }

    let output = child.wait_with_output().map_err(spawn_err)?;
    if !output.status.success() {
        let message = String::from_utf8_lossy(output.stderr.as_slice())
            .trim_end()
            .to_string();
        return Err(SystemError::Failed { command, message });
    }

    Ok(())
}

fn describe(cmd: &OsStr) -> String {
    cmd.to_string_lossy().into_owned()
}

/// Host system access error types.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Program cannot be started or waited on.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Program exited unsuccessfully.
    #[error("command {command:?} failed: {message}")]
    Failed { command: String, message: String },

    /// Account database lookup fails.
    #[error("failed to look up account {user:?}")]
    Lookup {
        #[source]
        source: Errno,
        user: String,
    },

    /// File system access fails.
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = SystemError> = std::result::Result<T, E>;

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory system for step tests.

    use super::*;
    use std::{
        cell::RefCell,
        collections::{BTreeMap, BTreeSet, HashMap},
    };

    /// Recording fake of the host system.
    ///
    /// Queries answer from a canned table keyed by the invocation's display
    /// text; unknown queries fail like a missing package would. Mutations are
    /// applied to in-memory state and appended to a log.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSystem {
        pub(crate) answers: HashMap<String, String>,
        pub(crate) failing: BTreeSet<String>,
        pub(crate) keys: RefCell<BTreeMap<(String, String), String>>,
        pub(crate) files: RefCell<BTreeMap<PathBuf, String>>,
        pub(crate) paths: RefCell<BTreeSet<PathBuf>>,
        pub(crate) accounts: BTreeSet<String>,
        pub(crate) log: RefCell<Vec<String>>,
    }

    impl FakeSystem {
        pub(crate) fn answer(mut self, command: &str, output: &str) -> Self {
            self.answers.insert(command.into(), output.into());
            self
        }

        pub(crate) fn fail(mut self, command: &str) -> Self {
            self.failing.insert(command.into());
            self
        }

        pub(crate) fn key(self, schema: &str, key: &str, value: &str) -> Self {
            self.keys
                .borrow_mut()
                .insert((schema.into(), key.into()), value.into());
            self
        }

        pub(crate) fn file(self, path: &str, contents: &str) -> Self {
            self.files.borrow_mut().insert(path.into(), contents.into());
            self.path(path)
        }

        pub(crate) fn path(self, path: &str) -> Self {
            let mut paths = self.paths.borrow_mut();
            let mut current = Some(Path::new(path));
            while let Some(path) = current {
                if path.as_os_str().is_empty() {
                    break;
                }
                paths.insert(path.to_path_buf());
                current = path.parent();
            }
            drop(paths);
            self
        }

        pub(crate) fn account(mut self, user: &str) -> Self {
            self.accounts.insert(user.into());
            self
        }

        pub(crate) fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }

        pub(crate) fn key_value(&self, schema: &str, key: &str) -> Option<String> {
            self.keys
                .borrow()
                .get(&(schema.to_string(), key.to_string()))
                .cloned()
        }

        pub(crate) fn file_contents(&self, path: &str) -> Option<String> {
            self.files.borrow().get(Path::new(path)).cloned()
        }

        fn record(&self, entry: String) {
            self.log.borrow_mut().push(entry);
        }

        fn check(&self, command: &str) -> Result<()> {
            if self.failing.contains(command) {
                return Err(SystemError::Failed {
                    command: command.into(),
                    message: "simulated failure".into(),
                });
            }

            Ok(())
        }
    }

    impl System for FakeSystem {
        fn query(&self, invocation: &Invocation) -> Result<String> {
            let command = invocation.to_string();
            self.check(&command)?;
            self.answers
                .get(&command)
                .cloned()
                .ok_or(SystemError::Failed {
                    command,
                    message: "no canned answer".into(),
                })
        }

        fn run(&self, invocation: &Invocation) -> Result<()> {
            let command = invocation.to_string();
            self.check(&command)?;
            self.record(format!("run {command}"));
            Ok(())
        }

        fn read_key(&self, schema: &str, key: &str) -> Result<String> {
            self.key_value(schema, key).ok_or(SystemError::Failed {
                command: format!("gsettings get {schema} {key}"),
                message: "No such schema".into(),
            })
        }

        fn write_key(&self, schema: &str, key: &str, value: &str) -> Result<()> {
            self.check(&format!("gsettings set {schema} {key}"))?;
            self.keys
                .borrow_mut()
                .insert((schema.into(), key.into()), value.into());
            self.record(format!("set {schema} {key} {value}"));
            Ok(())
        }

        fn read_file(&self, path: &Path) -> Result<Option<String>> {
            Ok(self.files.borrow().get(path).cloned())
        }

        fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), contents.into());
            self.paths.borrow_mut().insert(path.to_path_buf());
            self.record(format!("write {}", path.display()));
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.paths.borrow().contains(path)
        }

        fn account_exists(&self, user: &str) -> Result<bool> {
            Ok(self.accounts.contains(user))
        }

        fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
            Ok(self
                .paths
                .borrow()
                .iter()
                .filter(|entry| entry.parent() == Some(path))
                .cloned()
                .collect())
        }

        fn install_file(&self, source: &Path, destination: &Path) -> Result<()> {
            self.paths.borrow_mut().insert(destination.to_path_buf());
            self.record(format!(
                "install {} {}",
                source.display(),
                destination.display()
            ));
            Ok(())
        }

        fn install_tree(&self, source: &Path, destination: &Path) -> Result<()> {
            self.paths.borrow_mut().insert(destination.to_path_buf());
            self.record(format!(
                "install-tree {} {}",
                source.display(),
                destination.display()
            ));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn privileged_invocation_is_escalated() {
        let invocation = Invocation::privileged("apt-get")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .args(["install", "-y", "vim"]);
        let host = HostSystem::new(["sudo"]);
        let (program, args) = host.split(&invocation);

        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            vec![
                "env",
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
                "vim"
            ]
        );
        assert_eq!(invocation.to_string(), "apt-get install -y vim");
    }

    #[test]
    fn unprivileged_invocation_runs_as_is() {
        let invocation = Invocation::new("gsettings").args(["get", "a", "b"]);
        let host = HostSystem::new(["sudo"]);
        let (program, args) = host.split(&invocation);

        assert_eq!(program, "gsettings");
        assert_eq!(args, vec!["get", "a", "b"]);
    }

    #[test]
    fn root_does_not_escalate() {
        let invocation = Invocation::privileged("update-grub");
        let host = HostSystem::new(Vec::<String>::new());
        let (program, args) = host.split(&invocation);

        assert_eq!(program, "update-grub");
        assert!(args.is_empty());
    }

    #[test]
    fn desktop_keys_run_as_target_account() {
        let host = HostSystem::new(Vec::<String>::new()).with_desktop_user(Some("alice".into()));
        let (program, args) = host.gsettings(&[
            "set",
            "org.gnome.desktop.interface",
            "color-scheme",
            "'prefer-dark'",
        ]);

        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            vec![
                "-H",
                "-u",
                "alice",
                "dbus-run-session",
                "--",
                "gsettings",
                "set",
                "org.gnome.desktop.interface",
                "color-scheme",
                "'prefer-dark'"
            ]
        );
    }

    #[test]
    fn desktop_keys_run_directly_for_current_account() -> anyhow::Result<()> {
        let host = HostSystem::new(["sudo"]);
        let (program, args) = host.gsettings(&["get", "s", "k"]);
        assert_eq!(program, "gsettings");
        assert_eq!(args, vec!["get", "s", "k"]);

        if let Some(me) = User::from_uid(getuid())? {
            let host = HostSystem::new(["sudo"]).acting_for(me.name);
            assert_eq!(host.desktop_user, None);
        }

        let host = HostSystem::new(["sudo"]).acting_for("fitout-no-such-account");
        assert_eq!(host.desktop_user.as_deref(), Some("fitout-no-such-account"));

        Ok(())
    }

    #[test]
    fn host_knows_root_account() -> anyhow::Result<()> {
        let host = HostSystem::new(Vec::<String>::new());
        assert!(host.account_exists("root")?);
        assert!(!host.account_exists("fitout-no-such-account")?);

        Ok(())
    }

    #[test]
    fn host_lists_directory_sorted() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("b"), "")?;
        std::fs::write(dir.path().join("a"), "")?;

        let host = HostSystem::new(Vec::<String>::new());
        let result = host.list_dir(dir.path())?;
        assert_eq!(result, vec![dir.path().join("a"), dir.path().join("b")]);
        assert_eq!(host.read_file(&dir.path().join("missing"))?, None);

        Ok(())
    }

    #[test]
    fn dry_run_drops_writes() -> anyhow::Result<()> {
        let fake = fake::FakeSystem::default().key("s", "k", "'a'");
        let dry = DryRun::new(fake);

        dry.write_key("s", "k", "'b'")?;
        dry.run(&Invocation::privileged("update-grub"))?;
        assert_eq!(dry.read_key("s", "k")?, "'a'");
        assert!(dry.inner.log().is_empty());

        Ok(())
    }
}
