//! Event relation access — the write-once record of every capture.
//!
//! Events are inserted by capture collaborators and never deleted; the
//! `vectorized` flag is the only mutation, applied by the engine after an
//! embedding has been durably stored. Content is not interpreted here —
//! empty and missing content are valid (a screenshot with no text, a failed
//! upstream OCR step).

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Error;
use crate::event::types::{Event, SourceType};

/// Insert a new event. Returns the store-assigned id.
pub fn insert_event(
    conn: &Connection,
    timestamp: i64,
    source_type: &SourceType,
    content: Option<&str>,
    media_path: Option<&str>,
) -> Result<i64, Error> {
    conn.execute(
        "INSERT INTO events (timestamp, source_type, content, vectorized, media_path) \
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![timestamp, source_type.as_str(), content, media_path],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(event_id = id, source = %source_type, "event stored");
    Ok(id)
}

/// Fetch a single event by id. Returns `None` if no such event exists.
pub fn get_event(conn: &Connection, event_id: i64) -> Result<Option<Event>, Error> {
    let event = conn
        .query_row(
            "SELECT id, timestamp, source_type, content, vectorized, media_path \
             FROM events WHERE id = ?1",
            params![event_id],
            row_to_event,
        )
        .optional()?;
    Ok(event)
}

/// All events, newest first.
pub fn list_events(conn: &Connection) -> Result<Vec<Event>, Error> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, source_type, content, vectorized, media_path \
         FROM events ORDER BY timestamp DESC",
    )?;
    let events = stmt
        .query_map([], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Set the vectorized flag. Idempotent; a no-op if already set.
pub fn mark_vectorized(conn: &Connection, event_id: i64) -> Result<(), Error> {
    conn.execute(
        "UPDATE events SET vectorized = 1 WHERE id = ?1",
        params![event_id],
    )?;
    Ok(())
}

/// Events eligible for a vectorization sweep: non-blank content, and either
/// not yet vectorized or `force`. Returned in insertion order.
pub fn backlog(conn: &Connection, force: bool) -> Result<Vec<(i64, String)>, Error> {
    let mut stmt = conn.prepare(
        "SELECT id, content FROM events \
         WHERE content IS NOT NULL AND TRIM(content) != '' \
           AND (vectorized = 0 OR ?1) \
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![force], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let source: String = row.get(2)?;
    Ok(Event {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        source_type: SourceType::from(source),
        content: row.get(3)?,
        vectorized: row.get(4)?,
        media_path: row.get(5)?,
    })
}
