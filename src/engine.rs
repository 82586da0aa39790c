//! Coordinator for storage, vectorization, and search.
//!
//! [`Engine`] is the one component capture workers and the CLI talk to. It
//! owns the database connection, the embedding provider (loaded once per
//! process), the in-memory similarity index, and the snapshot path. It is an
//! explicitly constructed value — tests hand it an in-memory database and a
//! fake provider.
//!
//! Two guarantees are deliberately independent: event insertion is atomic and
//! always surfaced, vector persistence is best-effort. A capture must never
//! be lost because embedding failed; failed events stay eligible for a later
//! [`Engine::sweep_backlog`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rusqlite::Connection;
use serde::Serialize;

use crate::config::MnemoConfig;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::Error;
use crate::event::stats::store_stats;
use crate::event::store as events;
use crate::event::types::{Event, SourceType};
use crate::expand::QueryExpander;
use crate::index::{self, FlatIndex};

/// Outcome of [`Engine::store_and_maybe_vectorize`].
#[derive(Debug, Serialize)]
pub struct StoreOutcome {
    pub event_id: i64,
    /// Whether an embedding was stored in this call.
    pub vectorized: bool,
    /// Why vectorization failed, if it did. The event itself is durable
    /// either way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorize_error: Option<String>,
}

/// Per-event tally from a backlog sweep.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One search hit. `distance` is a squared Euclidean distance — lower is
/// more similar. It is a distance, not a probability.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEvent {
    #[serde(flatten)]
    pub event: Event,
    pub distance: f32,
}

/// Read-only aggregate over both relations and the live index.
#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_vectors: u64,
    pub dimension: usize,
    pub index_size: u64,
    pub non_vectorized_events: u64,
    pub by_source_type: HashMap<String, u64>,
}

pub struct Engine {
    conn: Mutex<Connection>,
    provider: Arc<dyn EmbeddingProvider>,
    index: RwLock<FlatIndex>,
    index_path: PathBuf,
    model_id: Option<String>,
}

impl Engine {
    /// Build an engine over an already-open connection and provider, running
    /// the index consistency pass. Fails with
    /// [`Error::DimensionMismatch`] when a persisted snapshot disagrees with
    /// the provider's dimension.
    pub fn new(
        conn: Connection,
        provider: Arc<dyn EmbeddingProvider>,
        index_path: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let index_path = index_path.into();
        let index = index::ensure_consistent(&conn, &index_path, provider.dimensions())?;
        Ok(Self {
            conn: Mutex::new(conn),
            provider,
            index: RwLock::new(index),
            index_path,
            model_id: None,
        })
    }

    /// Record which embedding model this engine runs, so forced sweeps can
    /// update the stored model identity.
    pub fn with_model_id(mut self, model: impl Into<String>) -> Self {
        self.model_id = Some(model.into());
        self
    }

    /// Open the configured database and embedding provider.
    pub fn open(config: &MnemoConfig) -> anyhow::Result<Self> {
        let conn = db::open_database(config.resolved_db_path())?;
        let provider: Arc<dyn EmbeddingProvider> =
            Arc::from(embedding::create_provider(&config.embedding)?);
        let engine = Self::new(conn, provider, config.resolved_index_path())?;
        Ok(engine.with_model_id(config.embedding.model.clone()))
    }

    /// Insert an event, then synchronously embed and index its content when
    /// `auto_vectorize` is set and the content is non-blank.
    ///
    /// The insert is durable regardless of what vectorization does; an
    /// embedding failure is logged, reported in the outcome, and leaves the
    /// event eligible for a later sweep.
    pub fn store_and_maybe_vectorize(
        &self,
        timestamp: i64,
        source_type: &SourceType,
        content: Option<&str>,
        media_path: Option<&str>,
        auto_vectorize: bool,
    ) -> Result<StoreOutcome, Error> {
        let event_id = {
            let conn = self.lock_conn();
            events::insert_event(&conn, timestamp, source_type, content, media_path)?
        };

        let text = content.map(str::trim).filter(|t| !t.is_empty());
        let (vectorized, vectorize_error) = match text {
            Some(text) if auto_vectorize => match self.vectorize_event(event_id, text) {
                Ok(()) => (true, None),
                Err(err) => {
                    tracing::warn!(event_id, %err, "vectorization failed; event kept for backlog sweep");
                    (false, Some(err.to_string()))
                }
            },
            _ => (false, None),
        };

        Ok(StoreOutcome {
            event_id,
            vectorized,
            vectorize_error,
        })
    }

    /// Fetch one event by id.
    pub fn get(&self, event_id: i64) -> Result<Option<Event>, Error> {
        let conn = self.lock_conn();
        events::get_event(&conn, event_id)
    }

    /// All events, newest first.
    pub fn list_all(&self) -> Result<Vec<Event>, Error> {
        let conn = self.lock_conn();
        events::list_events(&conn)
    }

    /// Vectorize everything in the backlog: events with non-blank content
    /// that are not yet vectorized, or — with `force` — every event with
    /// content, replacing existing embeddings (re-indexing after a model
    /// change). One failing event never aborts the sweep.
    pub fn sweep_backlog(&self, force: bool) -> Result<SweepReport, Error> {
        let pending = {
            let conn = self.lock_conn();
            events::backlog(&conn, force)?
        };

        let mut report = SweepReport::default();
        for (event_id, content) in pending {
            report.processed += 1;
            let outcome = if force {
                self.revectorize_event(event_id, &content)
            } else {
                self.vectorize_event(event_id, &content)
            };
            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(event_id, %err, "sweep: event failed, continuing");
                }
            }
        }

        if force {
            // Replaced rows invalidated index positions; rebuild once.
            let conn = self.lock_conn();
            let rebuilt = index::rebuild_from_store(&conn, self.provider.dimensions())?;
            let mut index = self.write_index();
            *index = rebuilt;
            self.persist_index(&index);
            if let Some(model) = &self.model_id {
                db::migrations::set_embedding_model(&conn, model)?;
            }
        }

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            force,
            "backlog sweep finished"
        );
        Ok(report)
    }

    /// Similarity search with query fusion.
    ///
    /// The query set is the original plus any paraphrases the expander
    /// produces; an expander failure degrades to the original query alone.
    /// Every phrasing is embedded and searched independently, hits are fused
    /// per event by their best (smallest) distance, and the fused set is
    /// sorted ascending and truncated to `top_k`.
    ///
    /// The min-reduction assumes all phrasings are embedded by one
    /// fixed-norm model — holds for the single process-lifetime provider,
    /// and a constraint on any replacement provider.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        expander: Option<&dyn QueryExpander>,
    ) -> Result<Vec<ScoredEvent>, Error> {
        let query = query.trim();
        if query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut phrasings = vec![query.to_string()];
        if let Some(expander) = expander {
            match expander.expand(query) {
                Ok(extra) => {
                    for phrasing in extra {
                        let phrasing = phrasing.trim().to_string();
                        if !phrasing.is_empty() && !phrasings.contains(&phrasing) {
                            phrasings.push(phrasing);
                        }
                    }
                }
                Err(err) => {
                    let err = Error::Expansion(err.to_string());
                    tracing::warn!(%err, "continuing with the original query only");
                }
            }
        }

        let mut best: HashMap<i64, f32> = HashMap::new();
        {
            let index = self.read_index();
            if index.is_empty() {
                return Ok(Vec::new());
            }
            for phrasing in &phrasings {
                let vector = match self.provider.embed(phrasing) {
                    Ok(v) => v,
                    Err(err) => {
                        tracing::warn!(variant = %phrasing, %err, "could not embed query variant, skipping");
                        continue;
                    }
                };
                for (event_id, distance) in index.search(&vector, top_k) {
                    best.entry(event_id)
                        .and_modify(|d| {
                            if distance < *d {
                                *d = distance;
                            }
                        })
                        .or_insert(distance);
                }
            }
        }

        let mut fused: Vec<(i64, f32)> = best.into_iter().collect();
        // Tie-break on event id so equal distances order the same way on
        // every run and after every rebuild.
        fused.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        fused.truncate(top_k);

        let conn = self.lock_conn();
        let mut results = Vec::with_capacity(fused.len());
        for (event_id, distance) in fused {
            match events::get_event(&conn, event_id)? {
                Some(event) => results.push(ScoredEvent { event, distance }),
                None => tracing::warn!(event_id, "index hit has no event row, skipping"),
            }
        }
        Ok(results)
    }

    /// Read-only aggregate: vector totals, index dimension and size, backlog
    /// count, and per-source vector counts.
    pub fn stats(&self) -> Result<Stats, Error> {
        let conn = self.lock_conn();
        let store = store_stats(&conn)?;
        let index = self.read_index();
        Ok(Stats {
            total_vectors: store.total_vectors,
            dimension: index.dimension(),
            index_size: index.len() as u64,
            non_vectorized_events: store.non_vectorized_events,
            by_source_type: store.by_source_type,
        })
    }

    /// Embed and durably record one event's text: vector row commit, index
    /// append, vectorized flag, snapshot persist — in that order.
    fn vectorize_event(&self, event_id: i64, text: &str) -> Result<(), Error> {
        let vector = self
            .provider
            .embed(text)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let conn = self.lock_conn();
        let mut index = self.write_index();

        if index::has_vector(&conn, event_id)? {
            // One vector per event; re-vectorizing is the forced sweep's job.
            tracing::debug!(event_id, "already has a vector, only syncing the flag");
            events::mark_vectorized(&conn, event_id)?;
            return Ok(());
        }

        index::insert_vector(&conn, event_id, &vector)?;
        index.add(event_id, &vector)?;
        events::mark_vectorized(&conn, event_id)?;
        self.persist_index(&index);
        Ok(())
    }

    /// Forced-sweep path: replace the event's vector row. Index positions are
    /// repaired by the rebuild at the end of the sweep.
    fn revectorize_event(&self, event_id: i64, text: &str) -> Result<(), Error> {
        let vector = self
            .provider
            .embed(text)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let conn = self.lock_conn();
        index::replace_vector(&conn, event_id, &vector)?;
        events::mark_vectorized(&conn, event_id)?;
        Ok(())
    }

    /// Snapshot write failure after the row commit is logged, not raised:
    /// the relations and in-memory index are already consistent, and a stale
    /// snapshot is exactly what the startup pass repairs.
    fn persist_index(&self, index: &FlatIndex) {
        if let Err(err) = index.save(&self.index_path) {
            tracing::warn!(%err, path = %self.index_path.display(), "index snapshot write failed; will rebuild on next startup");
        }
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_index(&self) -> RwLockReadGuard<'_, FlatIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, FlatIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}
