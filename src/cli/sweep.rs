//! CLI `sweep` command — vectorize the backlog, or re-embed everything.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use mnemo::config::MnemoConfig;
use mnemo::engine::Engine;

/// Run a backlog sweep. With `force`, every event with content is re-embedded
/// with the currently configured model and the index is rebuilt.
pub fn sweep(config: &MnemoConfig, force: bool) -> Result<()> {
    let engine = Engine::open(config)?;

    if force {
        println!(
            "Re-embedding all events with model '{}'...",
            config.embedding.model
        );
    } else {
        println!("Vectorizing backlog...");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .expect("valid template"),
    );
    spinner.set_message("embedding events");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = engine.sweep_backlog(force)?;
    spinner.finish_and_clear();

    if report.processed == 0 {
        println!("Nothing to do — no eligible events.");
        return Ok(());
    }

    println!(
        "Processed {} event(s): {} vectorized, {} failed.",
        report.processed, report.succeeded, report.failed
    );
    if report.failed > 0 {
        println!("Failed events remain in the backlog; re-run `mnemo sweep` to retry.");
    }

    Ok(())
}
