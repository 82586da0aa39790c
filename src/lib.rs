//! Mnemo — a durable archive of captured screen text and audio transcriptions,
//! searchable by meaning rather than exact keywords.
//!
//! Capture processes (screen OCR loop, audio transcription loop) hand finished
//! text to this crate; everything upstream of that — grabbing frames, running
//! OCR or speech-to-text, summarizing — lives outside. Mnemo owns the two
//! durable relations (`events` and `vectors`), the in-process similarity index
//! derived from them, and the search path that fuses results across paraphrased
//! queries.
//!
//! # Architecture
//!
//! - **Storage**: SQLite. `events` is the authoritative record of every
//!   capture; `vectors` associates each event with its embedding and is what
//!   the similarity index is rebuilt from.
//! - **Index**: a flat squared-L2 nearest-neighbor structure held in memory
//!   and snapshotted to disk. The snapshot is a cache — losing it only costs
//!   a rebuild at the next startup.
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Search**: each phrasing of a query is embedded and run through the
//!   index independently; hits are fused per event by best distance
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, migrations, and health checks
//! - [`embedding`] — Text-to-vector embedding pipeline via ONNX Runtime
//! - [`event`] — The event relation: capture records and their lifecycle flag
//! - [`expand`] — Optional query-paraphrase collaborator interface
//! - [`index`] — Vector relation, flat similarity index, and startup recovery
//! - [`engine`] — Coordinator tying store, provider, and index together

pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod event;
pub mod expand;
pub mod index;

pub use error::Error;
