//! The `history` subcommand.

use console::style;

use crate::config::Settings;
use crate::history::HistoryLog;

pub fn cmd_history(settings: &Settings, limit: usize, clear: bool) -> anyhow::Result<()> {
    let mut log = HistoryLog::load(settings.history_path());

    if clear {
        log.clear()?;
        println!("{} History cleared", style("✓").green());
        return Ok(());
    }

    if log.entries().is_empty() {
        println!("{} No documents processed yet", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Recent Documents").bold());
    println!("{}", "-".repeat(60));

    let entries: Vec<_> = log.entries().iter().rev().take(limit).collect();
    for entry in entries {
        println!(
            "{:<19} {:<8} {:>4}/{:<4} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.method.as_str(),
            entry.succeeded,
            entry.units,
            entry.file_name
        );
    }

    Ok(())
}
