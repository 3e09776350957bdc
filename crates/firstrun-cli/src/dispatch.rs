use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use firstrun_core::Catalog;
use firstrun_tracker::{AggregateFlags, InstallTracker, LineMatcher};

use crate::completion::write_completion_script;
use crate::render;
use crate::tail::LogTail;

#[derive(Parser, Debug)]
#[command(name = "firstrun")]
#[command(about = "Track provisioning installs from the install log", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a catalog file and show the resolved entries
    Validate { catalog: PathBuf },
    /// Replay an existing log and print the per-package state
    Status {
        catalog: PathBuf,
        log: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Follow the log as it grows and render live progress
    Watch {
        catalog: PathBuf,
        log: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = UntilGate::Done)]
        until: UntilGate,
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Print a shell completion script
    InitShell { shell: Shell },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UntilGate {
    /// Stop once every required package is complete
    Continue,
    /// Stop once every package is complete
    Done,
    /// Stop only when every package succeeded
    AllSuccess,
}

impl UntilGate {
    pub fn reached(self, flags: AggregateFlags) -> bool {
        match self {
            Self::Continue => flags.required_complete,
            Self::Done => flags.all_complete,
            Self::AllSuccess => flags.all_succeeded,
        }
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Validate { catalog } => run_validate(&catalog),
        Commands::Status {
            catalog,
            log,
            json,
            rules,
        } => run_status(&catalog, &log, json, rules.as_deref()),
        Commands::Watch {
            catalog,
            log,
            rules,
            until,
            interval_ms,
        } => run_watch(&catalog, &log, rules.as_deref(), until, interval_ms),
        Commands::InitShell { shell } => {
            let mut stdout = std::io::stdout();
            write_completion_script(shell, &mut stdout)
        }
    }
}

fn load_matcher(rules: Option<&Path>) -> Result<LineMatcher> {
    match rules {
        Some(path) => LineMatcher::from_path(path),
        None => Ok(LineMatcher::jamf_default()),
    }
}

fn run_validate(catalog_path: &Path) -> Result<()> {
    let catalog = Catalog::from_path(catalog_path)?;

    for warning in &catalog.warnings {
        println!("{}", render::warning_line(&warning.to_string()));
    }
    for line in render::descriptor_lines(&catalog.packages) {
        println!("{line}");
    }
    println!(
        "{} package(s), {} warning(s)",
        catalog.packages.len(),
        catalog.warnings.len()
    );
    Ok(())
}

fn run_status(catalog_path: &Path, log_path: &Path, json: bool, rules: Option<&Path>) -> Result<()> {
    let catalog = Catalog::from_path(catalog_path)?;
    let matcher = load_matcher(rules)?;
    let mut tracker = InstallTracker::new(&catalog.packages, matcher);

    let bytes = fs::read(log_path)
        .with_context(|| format!("failed to read log file: {}", log_path.display()))?;
    for line in String::from_utf8_lossy(&bytes).lines() {
        tracker.apply_log_line(line);
    }

    if json {
        println!(
            "{}",
            render::snapshot_json(&tracker.snapshot(), tracker.flags())?
        );
    } else {
        for line in render::package_table(&tracker.snapshot()) {
            println!("{line}");
        }
        for line in render::flag_summary(tracker.flags()) {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_watch(
    catalog_path: &Path,
    log_path: &Path,
    rules: Option<&Path>,
    until: UntilGate,
    interval_ms: u64,
) -> Result<()> {
    let catalog = Catalog::from_path(catalog_path)?;
    let matcher = load_matcher(rules)?;
    let mut tracker = InstallTracker::new(&catalog.packages, matcher);

    let bar = render::watch_bar(tracker.visible().len() as u64);
    let printer = bar.clone();
    tracker.subscribe(move |event| printer.println(render::lifecycle_line(event)));

    let mut tail = LogTail::new(log_path);
    loop {
        for line in tail.poll()? {
            tracker.apply_log_line(&line);
            render::update_watch_bar(&bar, &tracker.visible());
        }
        if until.reached(tracker.flags()) {
            break;
        }
        thread::sleep(Duration::from_millis(interval_ms));
    }

    bar.finish_and_clear();
    for line in render::package_table(&tracker.snapshot()) {
        println!("{line}");
    }
    Ok(())
}
