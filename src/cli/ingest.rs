//! CLI `ingest` command — store one captured event, used by capture
//! collaborators and for manual testing.

use anyhow::Result;

use mnemo::config::MnemoConfig;
use mnemo::engine::Engine;
use mnemo::event::SourceType;

pub fn ingest(
    config: &MnemoConfig,
    source: &str,
    content: Option<&str>,
    media_path: Option<&str>,
    timestamp: Option<i64>,
    no_vectorize: bool,
) -> Result<()> {
    let engine = Engine::open(config)?;
    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
    let source_type = SourceType::from(source);

    let outcome = engine.store_and_maybe_vectorize(
        timestamp,
        &source_type,
        content,
        media_path,
        !no_vectorize,
    )?;

    if outcome.vectorized {
        println!("Stored event #{} (vectorized).", outcome.event_id);
    } else if let Some(err) = outcome.vectorize_error {
        println!(
            "Stored event #{}; vectorization failed ({err}). It will be retried by `mnemo sweep`.",
            outcome.event_id
        );
    } else {
        println!("Stored event #{} (not vectorized).", outcome.event_id);
    }

    Ok(())
}
