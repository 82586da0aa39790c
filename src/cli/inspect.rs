//! CLI `inspect` command — show one event as JSON.

use anyhow::Result;

use mnemo::config::MnemoConfig;
use mnemo::db;
use mnemo::event::store::get_event;

/// Print a single event. Opens the database directly — no embedding model
/// is needed for a read.
pub fn inspect(config: &MnemoConfig, event_id: i64) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;

    match get_event(&conn, event_id)? {
        Some(event) => {
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        None => anyhow::bail!("event not found: {event_id}"),
    }
}
