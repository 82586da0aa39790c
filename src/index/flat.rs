//! Flat nearest-neighbor index over an append-only vector collection.
//!
//! Rows are stored in insertion order in a single contiguous `f32` buffer,
//! with the owning event id kept per row. Search is a brute-force squared
//! Euclidean scan — distances are "lower is better" and are not normalized
//! to similarity percentages. The whole structure serializes to a single
//! versioned snapshot file; the durable `vectors` relation remains the
//! source of truth and the snapshot can be discarded at any time.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

/// Bumped when the snapshot layout changes; older snapshots are rebuilt.
const SNAPSHOT_VERSION: u32 = 1;

/// In-memory flat index. Positions correspond to `vectors` rows in
/// insertion order; this ordinal position, not the event id, is the
/// internal key.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    ids: Vec<i64>,
    data: Vec<f32>,
}

/// On-disk form of [`FlatIndex`].
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    version: u32,
    dimension: usize,
    ids: Vec<i64>,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index. The dimension is fixed for the index lifetime.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append one vector. Rejects vectors of the wrong width rather than
    /// corrupting row alignment.
    pub fn add(&mut self, event_id: i64, vector: &[f32]) -> Result<(), Error> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                stored: vector.len(),
                live: self.dimension,
            });
        }
        self.ids.push(event_id);
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// The `k` nearest rows to `query` as `(event_id, squared L2 distance)`,
    /// ascending. Returns fewer than `k` when the index is smaller, and
    /// nothing at all for an empty index or a query of the wrong width.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(i64, f32)> {
        if self.is_empty() || query.len() != self.dimension {
            return Vec::new();
        }

        let mut hits: Vec<(i64, f32)> = self
            .ids
            .iter()
            .zip(self.data.chunks_exact(self.dimension))
            .map(|(&id, row)| (id, squared_l2(query, row)))
            .collect();

        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k.min(self.ids.len()));
        hits
    }

    /// Write a snapshot atomically (tmp + rename).
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let snapshot = IndexSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            ids: self.ids.clone(),
            data: self.data.clone(),
        };

        let tmp_path = path.with_extension("tmp");
        let file = std::fs::File::create(&tmp_path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), &snapshot)?;
        std::fs::rename(&tmp_path, path)?;

        tracing::debug!(vectors = self.len(), path = %path.display(), "index snapshot written");
        Ok(())
    }

    /// Load a snapshot. Any structural problem — unreadable file, unknown
    /// version, misaligned buffer — is an error; callers fall back to a
    /// rebuild from the vector relation.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        let snapshot: IndexSnapshot = serde_json::from_reader(std::io::BufReader::new(file))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(malformed(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        if snapshot.data.len() != snapshot.dimension * snapshot.ids.len() {
            return Err(malformed(format!(
                "snapshot buffer holds {} floats for {} rows of dimension {}",
                snapshot.data.len(),
                snapshot.ids.len(),
                snapshot.dimension
            )));
        }

        Ok(Self {
            dimension: snapshot.dimension,
            ids: snapshot.ids,
            data: snapshot.data,
        })
    }
}

fn malformed(message: String) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
