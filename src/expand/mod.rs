//! Query-expansion collaborator interface.
//!
//! Paraphrase generation lives outside this crate (an LLM behind some API).
//! Search treats it as strictly best-effort: any failure downgrades to "no
//! additional queries" and the original query still runs. The engine owns
//! that recovery boundary; implementations here just report what happened.

use anyhow::Result;

/// Produces alternate phrasings of a search query.
///
/// Implementations may call out to a remote or local language model; a
/// timeout or unavailable provider should surface as an `Err`, which search
/// recovers from. An empty Vec is a valid answer.
pub trait QueryExpander: Send + Sync {
    /// Return zero or more paraphrases of `query`, not including the
    /// original.
    fn expand(&self, query: &str) -> Result<Vec<String>>;
}
