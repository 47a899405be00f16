// UI module for consistent terminal output with progress bars and styling
//
// Everything that reaches the terminal goes through here: status lines, the
// live plugin board, the server download bar and list/search tables.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use crate::install::{InstallOutcome, InstallView, Renderer, UnitState, UnitStatus};
use crate::manifest::{Manifest, ServerConfig, Source};
use crate::sources::search::{SearchHit, truncate_description};
use console::{Term, style};
use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner style similar to uv/pnpm
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

const DESCRIPTION_WIDTH: usize = 60;

/// Check if stderr is a TTY (for interactive output)
fn is_tty() -> bool {
    Term::stderr().is_term()
}

/// Create a styled spinner for async operations
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if !is_tty() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars(SPINNER_CHARS)
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());

    if is_tty() {
        pb.enable_steady_tick(Duration::from_millis(80));
    }

    pb
}

/// Finish a spinner with success
pub fn finish_spinner_success(pb: &ProgressBar, message: &str) {
    finish_with(pb, format!("{} {}", style("✓").green(), message), false);
}

/// Finish a spinner with error
pub fn finish_spinner_error(pb: &ProgressBar, message: &str) {
    finish_with(pb, format!("{} {}", style("✗").red(), message), true);
}

fn finish_with(pb: &ProgressBar, msg: String, to_stderr: bool) {
    if is_tty() {
        pb.set_style(ProgressStyle::default_spinner().template("{msg}").unwrap());
        pb.finish_with_message(msg);
    } else {
        pb.finish_and_clear();
        if to_stderr {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    }
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print an info/action message with arrow
pub fn action(message: &str) {
    println!("{} {}", style("→").cyan(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red(), message);
}

/// Print a header/section message
pub fn header(message: &str) {
    println!("{}", style(message).bold());
}

/// Print a dimmed/secondary message
pub fn dim(message: &str) {
    println!("{}", style(message).dim());
}

/// Print a plain line
pub fn plain(message: &str) {
    println!("{}", message);
}

pub fn source_badge(source: Source) -> String {
    let label = format!("[{}]", source.label());
    match source {
        Source::Modrinth => style(label).green().bold().to_string(),
        Source::Hangar => style(label).blue().bold().to_string(),
        Source::Custom => style(label).magenta().bold().to_string(),
    }
}

pub fn status_badge(status: UnitStatus) -> String {
    let label = format!("{:<11}", status.label());
    match status {
        UnitStatus::Waiting | UnitStatus::Preparing => style(label).yellow().to_string(),
        UnitStatus::Downloading => style(label).blue().to_string(),
        UnitStatus::Checked => style(label).cyan().to_string(),
        UnitStatus::Installed => style(label).green().to_string(),
        UnitStatus::Failed => style(label).red().to_string(),
    }
}

/// One board line for a plugin.
pub fn render_unit_line(unit: &UnitState) -> String {
    let mut line = format!(
        "{} {} {}",
        source_badge(unit.source),
        status_badge(unit.status),
        unit.resource
    );

    match unit.status {
        UnitStatus::Downloading => {
            if let Some(total) = unit.total {
                line.push_str(&format!(
                    " {}",
                    style(format!("{} / {}", HumanBytes(unit.downloaded), HumanBytes(total))).dim()
                ));
            }
        }
        UnitStatus::Failed => {
            if let Some(error) = &unit.error {
                line.push_str(&format!(" {}", style(error).red().dim()));
            }
        }
        _ => {}
    }

    line
}

/// Live board with one line per plugin, redrawn in place.
pub struct PluginBoard {
    _multi: MultiProgress,
    bars: Vec<ProgressBar>,
    interactive: bool,
}

impl PluginBoard {
    pub fn new(units: usize) -> Self {
        let interactive = is_tty();
        let multi = MultiProgress::new();
        if !interactive {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }

        let line_style = ProgressStyle::default_spinner().template("{msg}").unwrap();
        let bars = (0..units)
            .map(|_| {
                let pb = multi.add(ProgressBar::new_spinner());
                pb.set_style(line_style.clone());
                pb
            })
            .collect();

        Self {
            _multi: multi,
            bars,
            interactive,
        }
    }
}

impl Renderer for PluginBoard {
    fn draw(&mut self, index: usize, unit: &UnitState) {
        if let Some(pb) = self.bars.get(index) {
            pb.set_message(render_unit_line(unit));
        }
    }

    fn finish(&mut self, view: &InstallView) {
        for pb in &self.bars {
            pb.finish();
        }
        if !self.interactive {
            for unit in &view.units {
                println!("{}", render_unit_line(unit));
            }
        }
    }
}

/// Byte progress for the server jar download. Starts as a spinner and turns
/// into a bar once the total size is known.
pub struct ServerBar {
    pb: ProgressBar,
    sized: bool,
}

impl ServerBar {
    pub fn new(message: &str) -> Self {
        Self {
            pb: spinner(message),
            sized: false,
        }
    }

    pub fn update(&mut self, downloaded: u64, total: u64) {
        if !self.sized {
            self.pb.set_length(total);
            self.pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.cyan} {msg} [{bar:25.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    )
                    .unwrap()
                    .tick_chars(SPINNER_CHARS)
                    .progress_chars("━━╺"),
            );
            self.sized = true;
        }
        self.pb.set_position(downloaded);
    }

    pub fn finish_success(self, message: &str) {
        finish_spinner_success(&self.pb, message);
    }

    pub fn finish_error(self, message: &str) {
        finish_spinner_error(&self.pb, message);
    }
}

/// Boxed summary of the `[server]` table.
pub fn server_config_box(server: &ServerConfig) {
    const TITLE: &str = "Server config:";
    let rows = [
        ("Server vendor", server.vendor.as_str()),
        ("Server project", server.project.as_str()),
        ("Server Minecraft version", server.minecraft_version.as_str()),
        ("Server version", server.version.as_str()),
    ];
    let key_width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0) + 2;
    let width = rows
        .iter()
        .map(|(_, value)| key_width + value.chars().count())
        .max()
        .unwrap_or(0)
        .max(TITLE.len());

    let border = "─".repeat(width + 4);
    println!("╭{}╮", border);
    println!("│  {}{}  │", style(TITLE).bold(), " ".repeat(width - TITLE.len()));
    println!("│  {}  │", " ".repeat(width));
    for (key, value) in rows {
        println!(
            "│  {}{}{}  │",
            style(format!("{:<key_width$}", key)).bold(),
            style(value).dim(),
            " ".repeat(width - key_width - value.chars().count())
        );
    }
    println!("╰{}╯", border);
}

/// Final tally of a plugin run, then each failure with its reason.
pub fn install_summary(outcome: &InstallOutcome) {
    let line = format!(
        "{} installed, {} checked, {} removed",
        outcome.installed, outcome.checked, outcome.removed
    );
    if outcome.is_success() {
        success(&line);
    } else {
        error(&format!("{}, {} failed", line, outcome.failed()));
        for failure in &outcome.failures {
            eprintln!("  {} {}", style(format!("{}:", failure.resource)).bold(), failure.message);
        }
    }
}

pub fn plugin_list(manifest: &Manifest) {
    if manifest.plugins.is_empty() {
        dim("No plugins configured.");
        return;
    }

    for plugin in &manifest.plugins {
        let version = match plugin.pinned_version() {
            Some(version) => style(version.to_string()).cyan(),
            None => style("(latest)".to_string()).dim(),
        };
        println!("{} {} {}", source_badge(plugin.source), plugin.resource, version);
    }
}

pub fn search_section(title: &str, hits: &[SearchHit]) {
    header(title);
    if hits.is_empty() {
        dim("  No results");
        return;
    }
    for hit in hits {
        println!(
            "  {}:{}  {}",
            hit.source.shorthand(),
            style(&hit.name).bold(),
            style(truncate_description(&hit.description, DESCRIPTION_WIDTH)).dim()
        );
    }
}
