//! Vector relation access and similarity-index lifecycle.
//!
//! The `vectors` relation is durable and authoritative; the [`FlatIndex`] is
//! a derived cache over it. [`ensure_consistent`] is the single startup
//! recovery path: it loads the snapshot when it agrees with the relation and
//! rebuilds from the relation otherwise. A dimension disagreement between
//! persisted vectors and the live embedding provider is fatal — stored
//! vectors would not be comparable to new queries.

pub mod flat;

pub use flat::FlatIndex;

use rusqlite::{params, Connection};
use std::path::Path;

use crate::error::Error;

/// Convert an f32 vector slice to raw bytes for BLOB storage.
pub fn vector_to_bytes(vector: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            vector.as_ptr() as *const u8,
            vector.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Decode a BLOB written by [`vector_to_bytes`].
pub fn vector_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(std::mem::size_of::<f32>())
        .map(|chunk| f32::from_ne_bytes(chunk.try_into().expect("chunk is 4 bytes")))
        .collect()
}

/// Append one embedding row for an event. Returns the vector row id.
pub fn insert_vector(conn: &Connection, event_id: i64, vector: &[f32]) -> Result<i64, Error> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO vectors (event_id, vector, dimension, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![event_id, vector_to_bytes(vector), vector.len() as i64, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace an event's embedding (forced re-vectorization after a model
/// change). Deletes any prior rows for the event before inserting, so the
/// one-vector-per-event invariant holds again afterwards.
pub fn replace_vector(conn: &Connection, event_id: i64, vector: &[f32]) -> Result<i64, Error> {
    conn.execute("DELETE FROM vectors WHERE event_id = ?1", params![event_id])?;
    insert_vector(conn, event_id, vector)
}

/// Whether the event already has an embedding row.
pub fn has_vector(conn: &Connection, event_id: i64) -> Result<bool, Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM vectors WHERE event_id = ?1",
        params![event_id],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Total embedding rows.
pub fn count_vectors(conn: &Connection) -> Result<usize, Error> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM vectors", [], |r| r.get(0))?;
    Ok(count as usize)
}

/// All embedding rows as `(event_id, vector)`, in insertion order — the
/// order index positions are derived from.
pub fn load_vectors(conn: &Connection) -> Result<Vec<(i64, Vec<f32>)>, Error> {
    let mut stmt =
        conn.prepare("SELECT event_id, vector FROM vectors ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            let event_id: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((event_id, blob))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(event_id, blob)| (event_id, vector_from_bytes(&blob)))
        .collect())
}

/// Populate a fresh index from the vector relation. Safe on an empty store.
pub fn rebuild_from_store(conn: &Connection, dimension: usize) -> Result<FlatIndex, Error> {
    let mut index = FlatIndex::new(dimension);
    for (event_id, vector) in load_vectors(conn)? {
        if vector.len() != dimension {
            return Err(Error::DimensionMismatch {
                stored: vector.len(),
                live: dimension,
            });
        }
        index.add(event_id, &vector)?;
    }
    tracing::info!(vectors = index.len(), "similarity index rebuilt from store");
    Ok(index)
}

/// Startup recovery: return an index guaranteed to agree with the vector
/// relation, rebuilding when the snapshot is missing, unreadable, or stale.
///
/// A snapshot whose dimension disagrees with the live provider is a fatal
/// configuration error, not a rebuild trigger — the stored vectors
/// themselves are unusable.
pub fn ensure_consistent(
    conn: &Connection,
    snapshot_path: &Path,
    dimension: usize,
) -> Result<FlatIndex, Error> {
    if !snapshot_path.exists() {
        tracing::info!(path = %snapshot_path.display(), "no index snapshot, rebuilding");
        return rebuild_from_store(conn, dimension);
    }

    let index = match FlatIndex::load(snapshot_path) {
        Ok(index) => index,
        Err(err) => {
            tracing::warn!(%err, path = %snapshot_path.display(), "index snapshot unreadable, rebuilding");
            return rebuild_from_store(conn, dimension);
        }
    };

    if index.dimension() != dimension {
        return Err(Error::DimensionMismatch {
            stored: index.dimension(),
            live: dimension,
        });
    }

    let stored = count_vectors(conn)?;
    if index.len() != stored {
        let err = Error::IndexInconsistency {
            index: index.len(),
            store: stored,
        };
        tracing::warn!(%err, "repairing by full rebuild");
        return rebuild_from_store(conn, dimension);
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::event::store::insert_event;
    use crate::event::types::SourceType;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    fn event(conn: &Connection, n: i64) -> i64 {
        insert_event(conn, n, &SourceType::Ocr, Some("text"), None).unwrap()
    }

    #[test]
    fn bytes_round_trip() {
        let v = vec![0.5f32, -2.25, 1e-7, 384.0];
        assert_eq!(vector_from_bytes(vector_to_bytes(&v)), v);
    }

    #[test]
    fn load_vectors_preserves_insertion_order() {
        let conn = test_db();
        let a = event(&conn, 1);
        let b = event(&conn, 2);
        insert_vector(&conn, b, &[2.0, 0.0]).unwrap();
        insert_vector(&conn, a, &[1.0, 0.0]).unwrap();

        let rows = load_vectors(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, b);
        assert_eq!(rows[1].0, a);
    }

    #[test]
    fn replace_vector_keeps_one_row_per_event() {
        let conn = test_db();
        let id = event(&conn, 1);
        insert_vector(&conn, id, &[1.0, 0.0]).unwrap();
        replace_vector(&conn, id, &[0.0, 1.0]).unwrap();

        assert_eq!(count_vectors(&conn).unwrap(), 1);
        let rows = load_vectors(&conn).unwrap();
        assert_eq!(rows[0].1, vec![0.0, 1.0]);
    }

    #[test]
    fn ensure_consistent_on_empty_store_is_empty_index() {
        let conn = test_db();
        let tmp = tempfile::TempDir::new().unwrap();
        let index = ensure_consistent(&conn, &tmp.path().join("vectors.idx"), 4).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 4);
    }

    #[test]
    fn ensure_consistent_rebuilds_when_snapshot_missing() {
        let conn = test_db();
        let a = event(&conn, 1);
        insert_vector(&conn, a, &[1.0, 0.0]).unwrap();

        let tmp = tempfile::TempDir::new().unwrap();
        let index = ensure_consistent(&conn, &tmp.path().join("vectors.idx"), 2).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.search(&[1.0, 0.0], 1)[0].0, a);
    }

    #[test]
    fn ensure_consistent_rebuilds_on_count_mismatch() {
        let conn = test_db();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vectors.idx");

        // Snapshot knows one vector; the store then gains a second (as after
        // a crash between row commit and snapshot write).
        let a = event(&conn, 1);
        insert_vector(&conn, a, &[1.0, 0.0]).unwrap();
        let mut index = FlatIndex::new(2);
        index.add(a, &[1.0, 0.0]).unwrap();
        index.save(&path).unwrap();

        let b = event(&conn, 2);
        insert_vector(&conn, b, &[0.0, 1.0]).unwrap();

        let repaired = ensure_consistent(&conn, &path, 2).unwrap();
        assert_eq!(repaired.len(), 2);
    }

    #[test]
    fn ensure_consistent_rebuilds_on_corrupt_snapshot() {
        let conn = test_db();
        let a = event(&conn, 1);
        insert_vector(&conn, a, &[1.0, 0.0]).unwrap();

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vectors.idx");
        std::fs::write(&path, b"{ definitely not json").unwrap();

        let index = ensure_consistent(&conn, &path, 2).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let conn = test_db();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vectors.idx");

        FlatIndex::new(384).save(&path).unwrap();

        let err = ensure_consistent(&conn, &path, 512).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { stored: 384, live: 512 }
        ));
    }

    #[test]
    fn rebuild_rejects_mismatched_stored_vector() {
        let conn = test_db();
        let a = event(&conn, 1);
        insert_vector(&conn, a, &[1.0, 0.0, 0.0]).unwrap();

        let err = rebuild_from_store(&conn, 2).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { stored: 3, live: 2 }));
    }
}
