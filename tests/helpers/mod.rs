#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use rusqlite::Connection;
use tempfile::TempDir;

use mnemo::db;
use mnemo::embedding::EmbeddingProvider;
use mnemo::engine::Engine;
use mnemo::expand::QueryExpander;

/// Small dimension keeps test vectors readable.
pub const TEST_DIM: usize = 8;

/// Unit vector with a spike at `position`.
pub fn spike(position: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; TEST_DIM];
    v[position % TEST_DIM] = 1.0;
    v
}

/// Deterministic embedding provider. Canned vectors are returned for exact
/// texts; anything else gets a stable hash-derived spike so every string is
/// embeddable. Texts registered via `failing_on` error instead.
pub struct FakeProvider {
    dim: usize,
    canned: HashMap<String, Vec<f32>>,
    fail_on: HashSet<String>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            dim: TEST_DIM,
            canned: HashMap::new(),
            fail_on: HashSet::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: &[f32]) -> Self {
        assert_eq!(vector.len(), self.dim, "canned vector has wrong dimension");
        self.canned.insert(text.to_string(), vector.to_vec());
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.insert(text.to_string());
        self
    }
}

impl EmbeddingProvider for FakeProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if self.fail_on.contains(text) {
            return Err(anyhow!("provider rejected {text:?}"));
        }
        if let Some(vector) = self.canned.get(text) {
            return Ok(vector.clone());
        }
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        Ok(spike(hasher.finish() as usize))
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// Provider that always fails.
pub struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow!("model not loaded"))
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }
}

/// Provider that fails its first `failures` calls, then behaves like
/// [`FakeProvider`]. Exercises the backlog-retry path.
pub struct FlakyProvider {
    remaining_failures: AtomicUsize,
    inner: FakeProvider,
}

impl FlakyProvider {
    pub fn new(failures: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(failures),
            inner: FakeProvider::new(),
        }
    }
}

impl EmbeddingProvider for FlakyProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("transient provider failure"));
        }
        self.inner.embed(text)
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }
}

/// Expander returning a fixed list of paraphrases.
pub struct FakeExpander(pub Vec<String>);

impl QueryExpander for FakeExpander {
    fn expand(&self, _query: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Expander that always fails (provider down, timeout).
pub struct FailingExpander;

impl QueryExpander for FailingExpander {
    fn expand(&self, _query: &str) -> anyhow::Result<Vec<String>> {
        Err(anyhow!("expansion provider unavailable"))
    }
}

/// Engine over an in-memory database and a temp snapshot path.
pub fn test_engine(provider: impl EmbeddingProvider + 'static) -> (Engine, TempDir) {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_memory_database().unwrap();
    let engine = Engine::new(conn, Arc::new(provider), tmp.path().join("vectors.idx")).unwrap();
    (engine, tmp)
}

/// Engine over an on-disk database inside `dir`, for restart simulations.
/// Drop the returned engine and call again to "restart".
pub fn disk_engine(dir: &TempDir, provider: impl EmbeddingProvider + 'static) -> Engine {
    let conn = db::open_database(dir.path().join("events.db")).unwrap();
    Engine::new(conn, Arc::new(provider), dir.path().join("vectors.idx")).unwrap()
}

/// Second connection to the on-disk database, for asserting raw rows.
pub fn raw_conn(dir: &TempDir) -> Connection {
    Connection::open(dir.path().join("events.db")).unwrap()
}
