use colored::*;
use interlace_common::config::{Config, Verbosity};
use interlace_common::log::PRINT_TARGET;
use interlace_core::PoolSummary;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 10;

/// Prints a line as-is, above the progress bar.
pub fn print(msg: &str) {
    tracing::info!(target: PRINT_TARGET, "{msg}");
}

pub fn banner(cfg: &Config) {
    if cfg.verbosity == Verbosity::Silent {
        return;
    }

    let text_content: String = format!("⟦ INTERLACE v{} ⟧", env!("CARGO_PKG_VERSION"));
    let text_width: usize = console::measure_text_width(&text_content);
    let text: ColoredString = text_content.color(colors::BANNER).bold();
    let sep: ColoredString = "═"
        .repeat(TOTAL_WIDTH.saturating_sub(text_width) / 2)
        .color(colors::SEPARATOR);
    print(&format!("{sep}{text}{sep}"));

    aligned_line("threads", cfg.threads.to_string());
    aligned_line("timeout", format!("{}s", cfg.timeout.as_secs()));
    if cfg.repeat != 1 {
        aligned_line("repeat", cfg.repeat.to_string());
    }
    if !cfg.cidr_expansion {
        aligned_line("cidr", "not expanded".to_string());
    }
    if let Some(dir) = &cfg.random_dir {
        aligned_line("random", dir.display().to_string());
    }
    if let Some(path) = &cfg.proxy_list {
        aligned_line("proxies", path.display().to_string());
    }

    header("running commands");
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {msg} ⟧");
    let msg_len: usize = console::measure_text_width(&formatted);

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    print(&format!(
        "{}{}{}",
        "─".repeat(left).color(colors::SEPARATOR),
        formatted.to_uppercase().color(colors::BANNER),
        "─".repeat(right).color(colors::SEPARATOR)
    ));
}

pub fn fat_separator() {
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

fn aligned_line(key: &str, value: String) {
    let dots: String = ".".repeat((KEY_WIDTH + 1).saturating_sub(key.len()));
    print(&format!(
        "{} {}{}{} {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::KEY),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value.color(colors::VALUE)
    ));
}

pub fn summary(summary: &PoolSummary) {
    header("summary");
    aligned_line("tasks", format!("{}/{}", summary.finished(), summary.total));
    aligned_line(
        "succeeded",
        summary.succeeded.to_string().color(colors::SUCCEEDED).to_string(),
    );
    if summary.failed > 0 {
        aligned_line("failed", summary.failed.to_string().color(colors::FAILED).to_string());
    }
    if summary.timed_out > 0 {
        aligned_line(
            "timed out",
            summary.timed_out.to_string().color(colors::TIMED_OUT).to_string(),
        );
    }
    if summary.cancelled > 0 {
        aligned_line(
            "cancelled",
            summary.cancelled.to_string().color(colors::CANCELLED).to_string(),
        );
    }
    aligned_line("elapsed", format!("{:.2?}", summary.elapsed));
    fat_separator();
}
