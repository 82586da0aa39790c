use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::Error;

/// Store-side aggregates, joined against the vector relation.
#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub total_events: u64,
    pub total_vectors: u64,
    pub non_vectorized_events: u64,
    /// Vector counts grouped by the owning event's source type.
    pub by_source_type: HashMap<String, u64>,
}

/// Compute event/vector counts for the stats surface.
pub fn store_stats(conn: &Connection) -> Result<StoreStats, Error> {
    let total_events: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))?;
    let total_vectors: i64 = conn.query_row("SELECT COUNT(*) FROM vectors", [], |r| r.get(0))?;
    let non_vectorized: i64 = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE vectorized = 0",
        [],
        |r| r.get(0),
    )?;

    let mut by_source_type = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT e.source_type, COUNT(v.id) \
         FROM events e JOIN vectors v ON v.event_id = e.id \
         GROUP BY e.source_type",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (source, count) in rows {
        by_source_type.insert(source, count as u64);
    }

    Ok(StoreStats {
        total_events: total_events as u64,
        total_vectors: total_vectors as u64,
        non_vectorized_events: non_vectorized as u64,
        by_source_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::event::store::{insert_event, mark_vectorized};
    use crate::event::types::SourceType;
    use crate::index::insert_vector;

    #[test]
    fn empty_store_stats() {
        let conn = db::open_memory_database().unwrap();
        let stats = store_stats(&conn).unwrap();
        assert_eq!(stats.total_events, 0);
        assert_eq!(stats.total_vectors, 0);
        assert_eq!(stats.non_vectorized_events, 0);
        assert!(stats.by_source_type.is_empty());
    }

    #[test]
    fn counts_group_by_source() {
        let conn = db::open_memory_database().unwrap();

        let a = insert_event(&conn, 1, &SourceType::Ocr, Some("screen text"), None).unwrap();
        let b = insert_event(&conn, 2, &SourceType::Ocr, Some("more screen text"), None).unwrap();
        let c = insert_event(&conn, 3, &SourceType::Transcription, Some("speech"), None).unwrap();
        insert_event(&conn, 4, &SourceType::Ocr, None, None).unwrap();

        for id in [a, b, c] {
            insert_vector(&conn, id, &[0.0, 1.0]).unwrap();
            mark_vectorized(&conn, id).unwrap();
        }

        let stats = store_stats(&conn).unwrap();
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.total_vectors, 3);
        assert_eq!(stats.non_vectorized_events, 1);
        assert_eq!(stats.by_source_type["ocr"], 2);
        assert_eq!(stats.by_source_type["transcription"], 1);
    }
}
