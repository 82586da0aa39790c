//! Error taxonomy for the storage and indexing core.
//!
//! The split matters operationally: [`Error::Storage`] is fatal to the calling
//! operation and always surfaced, while [`Error::Embedding`] and
//! [`Error::Expansion`] are recovered close to where they occur — an event
//! outlives a failed embedding, and a search outlives a failed paraphrase
//! call. The two startup variants distinguish a repairable cache divergence
//! from a configuration error that would silently produce wrong distances.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The durable store rejected or could not perform an operation.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The embedding provider failed or the text was unembeddable. The event
    /// this was for is already durable and stays eligible for a backlog sweep.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The query-expansion collaborator failed. Search proceeds with the
    /// original query only.
    #[error("query expansion failed: {0}")]
    Expansion(String),

    /// The similarity index and the vector relation disagree on row count,
    /// e.g. after a crash between the row commit and the snapshot write.
    /// Resolved by a full rebuild from the relation.
    #[error("similarity index holds {index} vectors but the store holds {store}")]
    IndexInconsistency { index: usize, store: usize },

    /// A persisted vector or index snapshot was produced by a provider with a
    /// different dimension than the one now configured. Stored vectors are
    /// not comparable to new queries; startup must halt.
    #[error("persisted vectors have dimension {stored} but the embedding provider produces {live}")]
    DimensionMismatch { stored: usize, live: usize },

    /// Snapshot file I/O failed.
    #[error("index snapshot i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed.
    #[error("index snapshot format: {0}")]
    Snapshot(#[from] serde_json::Error),
}
