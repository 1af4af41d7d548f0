// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use fitout::{
    collect::{
        font::{NoMetadata, TtfProbe},
        AssetCollector, CollectReport,
    },
    config::{ConfigPath, Configuration},
    path::default_config_file,
    provision::{
        menu::{self, InquirePrompter},
        preflight::{self, PreconditionError},
        system::{DryRun, HostSystem, System},
        Provisioner, RunReport, Selection, StepId,
    },
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  fitout collect [options]\n  fitout provision [options] [step]...",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Collect(opts) => run_collect(opts),
            Command::Provision(opts) => run_provision(opts),
            Command::Steps => run_steps(),
            Command::Config(opts) => run_config(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Stage fonts and wallpapers from a Windows installation.
    #[command(override_usage = "fitout collect [options]")]
    Collect(CollectOptions),

    /// Apply provisioning steps to this system.
    #[command(override_usage = "fitout provision [options] [step]...")]
    Provision(ProvisionOptions),

    /// List provisioning steps.
    #[command(override_usage = "fitout steps")]
    Steps,

    /// Show effective configuration.
    #[command(override_usage = "fitout config [options]")]
    Config(ConfigOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CollectOptions {
    /// Root of staged asset tree.
    #[arg(short, long, value_name = "dir")]
    pub output: Option<PathBuf>,

    /// Cloud font cache to read from.
    #[arg(long, value_name = "dir")]
    pub cloud_fonts: Option<PathBuf>,

    /// System font directory to read from.
    #[arg(long, value_name = "dir")]
    pub system_fonts: Option<PathBuf>,

    /// Wallpaper directory to read from.
    #[arg(long, value_name = "dir")]
    pub wallpapers: Option<PathBuf>,

    /// Keep original file names for cloud fonts.
    #[arg(long)]
    pub no_metadata: bool,

    /// Configuration file to use instead of the default one.
    #[arg(short, long, value_name = "file")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ProvisionOptions {
    /// Steps to run by position or name, or "all". Opens a menu when empty.
    #[arg(value_name = "step")]
    pub steps: Vec<String>,

    /// Continue without asking when the system is not the expected one.
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would change without changing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Root of staged asset tree.
    #[arg(short, long, value_name = "dir")]
    pub assets: Option<PathBuf>,

    /// Account whose desktop gets configured.
    #[arg(short, long, value_name = "name")]
    pub user: Option<String>,

    /// Configuration file to use instead of the default one.
    #[arg(short, long, value_name = "file")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConfigOptions {
    /// Configuration file to use instead of the default one.
    #[arg(short, long, value_name = "file")]
    pub config: Option<PathBuf>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        let code = error
            .downcast_ref::<PreconditionError>()
            .map_or(1, PreconditionError::exit_code);
        exit(code);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn load_config(path: Option<PathBuf>) -> Result<Configuration> {
    let config = match path {
        Some(path) => Configuration::load(path, true)?,
        None => Configuration::load(default_config_file()?, false)?,
    };

    Ok(config)
}

fn run_collect(opts: CollectOptions) -> Result<()> {
    let mut config = load_config(opts.config)?;
    let settings = &mut config.collect;
    if let Some(path) = opts.output {
        settings.destination = Some(ConfigPath::new(path));
    }
    if let Some(path) = opts.cloud_fonts {
        settings.cloud_fonts = Some(ConfigPath::new(path));
    }
    if let Some(path) = opts.system_fonts {
        settings.system_fonts = Some(ConfigPath::new(path));
    }
    if let Some(path) = opts.wallpapers {
        settings.wallpapers = Some(ConfigPath::new(path));
    }

    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<14}  [{wide_bar:.yellow/blue}]  {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);

    let destination = settings.destination();
    let sources = settings.sources();
    let report = if opts.no_metadata {
        AssetCollector::new(destination, NoMetadata).collect_all(sources, &bar)
    } else {
        AssetCollector::new(destination, TtfProbe::new()).collect_all(sources, &bar)
    };
    bar.finish_and_clear();

    summarize_collect(&report);
    Ok(())
}

fn summarize_collect(report: &CollectReport) {
    info!("copied {} files", report.copied.len());
    for root in &report.skipped {
        warn!("skipped missing source {:?}", root.display());
    }
    if !report.is_clean() {
        warn!("{} files could not be staged", report.failures.len());
    }
}

fn run_provision(opts: ProvisionOptions) -> Result<()> {
    let mut config = load_config(opts.config)?;
    let settings = &mut config.provision;
    if let Some(path) = opts.assets {
        settings.assets = Some(ConfigPath::new(path));
    }
    if let Some(user) = opts.user {
        settings.user = Some(user);
    }

    // INVARIANT: Reject bad step identifiers before touching the system.
    let selection = Selection::parse(&opts.steps)?;
    let user = preflight::resolve_user(settings.user.as_deref())?;

    let host = HostSystem::detect().acting_for(user.clone());
    let yes = opts.yes;
    preflight::run(&host, &settings.os, &user, |err| yes || confirm_anyway(err))?;

    let settings = config.provision;
    let report = if opts.dry_run {
        info!("dry run, nothing will be changed");
        execute(Provisioner::new(DryRun::new(host), settings, user), &selection)?
    } else {
        execute(Provisioner::new(host, settings, user), &selection)?
    };

    let failed = report.failed().count();
    if failed > 0 {
        for (step, err) in report.failed() {
            error!("step {step} failed: {err}");
        }
        bail!("{failed} of {} steps failed", report.results.len());
    }

    Ok(())
}

fn execute<S>(provisioner: Provisioner<S>, selection: &Selection) -> Result<RunReport>
where
    S: System,
{
    if selection.is_empty() {
        return Ok(menu::run(&provisioner, &mut InquirePrompter)?);
    }

    Ok(provisioner.run(selection))
}

fn confirm_anyway(err: &PreconditionError) -> bool {
    Confirm::new(&format!("{err}. Continue anyway?"))
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

fn run_steps() -> Result<()> {
    for step in StepId::ALL {
        println!(
            "{:>2}  {:<11} {}",
            step.position(),
            step.name(),
            step.description()
        );
    }

    Ok(())
}

fn run_config(opts: ConfigOptions) -> Result<()> {
    let config = load_config(opts.config)?;
    print!("{config}");

    Ok(())
}
