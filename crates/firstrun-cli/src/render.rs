use std::io::IsTerminal;

use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result};
use firstrun_core::{InstallStatus, PackageDescriptor, TrackedPackage};
use firstrun_tracker::{AggregateFlags, LifecycleEvent};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

fn status_style(status: InstallStatus) -> Style {
    match status {
        InstallStatus::Pending => Style::new().dimmed(),
        InstallStatus::Installing => AnsiColor::Cyan.on_default(),
        InstallStatus::Success => AnsiColor::Green.on_default().bold(),
        InstallStatus::Failed => AnsiColor::Red.on_default().bold(),
    }
}

fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

fn paint(style: Style, text: &str) -> String {
    if use_color() {
        format!("{}{}{}", style.render(), text, style.render_reset())
    } else {
        text.to_string()
    }
}

pub fn warning_line(message: &str) -> String {
    let label = paint(AnsiColor::Yellow.on_default().bold(), "warning:");
    format!("{label} {message}")
}

pub fn lifecycle_line(event: LifecycleEvent) -> String {
    let message = match event {
        LifecycleEvent::ErrorWhileInstalling => "an install reported a failure",
        LifecycleEvent::CanContinue => "required packages are complete",
        LifecycleEvent::DoneInstalling => "every package is complete",
        LifecycleEvent::AllSuccess => "every package succeeded",
    };
    format!("[{}] {message}", event.as_str())
}

pub fn descriptor_lines(packages: &[PackageDescriptor]) -> Vec<String> {
    packages
        .iter()
        .map(|descriptor| {
            let gate = if descriptor.can_continue {
                "gates continue"
            } else {
                "optional"
            };
            format!(
                "{} ({}) [{gate}] icon={}",
                descriptor.name, descriptor.display_name, descriptor.icon
            )
        })
        .collect()
}

pub fn package_table(packages: &[TrackedPackage]) -> Vec<String> {
    let width = packages
        .iter()
        .map(|package| package.display_name.len())
        .max()
        .unwrap_or(0);

    packages
        .iter()
        .map(|package| {
            let status = paint(
                status_style(package.status),
                &format!("{:<10}", package.status.as_str()),
            );
            let version = package.version.as_deref().unwrap_or("-");
            let hidden = if package.visible_in_ui { "" } else { "  (hidden)" };
            format!(
                "{status} {:<width$}  {version}{hidden}",
                package.display_name,
                width = width
            )
        })
        .collect()
}

pub fn flag_summary(flags: AggregateFlags) -> Vec<String> {
    vec![
        format!("any-failure: {}", flags.any_failure),
        format!("required-complete: {}", flags.required_complete),
        format!("all-complete: {}", flags.all_complete),
        format!("all-succeeded: {}", flags.all_succeeded),
    ]
}

pub fn snapshot_json(packages: &[TrackedPackage], flags: AggregateFlags) -> Result<String> {
    let value = json!({
        "packages": packages,
        "flags": flags,
    });
    serde_json::to_string_pretty(&value).context("failed to serialize snapshot")
}

pub fn watch_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total.max(1));
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan.bold} {msg:<24} [{bar:20.cyan/blue}] {pos:>2}/{len:2}",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

pub fn update_watch_bar(bar: &ProgressBar, visible: &[TrackedPackage]) {
    let complete = visible
        .iter()
        .filter(|package| package.is_complete())
        .count() as u64;
    bar.set_position(complete);
    if let Some(active) = visible
        .iter()
        .find(|package| package.status == InstallStatus::Installing)
    {
        bar.set_message(active.display_name.clone());
    }
}
