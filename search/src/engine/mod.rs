//! The full-text engine behind each index.
//!
//! The module talks to engines only through [`EngineFactory`] and [`IndexEngine`],
//! so the command layer never depends on how documents are tokenized or ranked.

use std::path::Path;

mod tantivy_engine;

pub use tantivy_engine::{TantivyEngine, TantivyFactory};

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("Engine error: {0}")]
        Tantivy(#[from] tantivy::TantivyError),

        #[error("Query parse error: {0}")]
        QueryParse(#[from] tantivy::query::QueryParserError),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
    }
}

use error::EngineError;

/// How documents are mapped into a new index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMapping {
    /// Keep the original document so it can be read back by id.
    pub store_source: bool,
}

impl Default for DocumentMapping {
    fn default() -> Self {
        Self { store_source: true }
    }
}

/// Opens engine instances in freshly allocated directories.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        path: &Path,
        mapping: &DocumentMapping,
    ) -> Result<Box<dyn IndexEngine>, EngineError>;
}

/// One open engine instance, exclusively owned by one index handle.
pub trait IndexEngine: Send {
    /// Adds `doc` under `id`, replacing any document already stored under that id.
    fn index(&mut self, id: &str, doc: &str) -> Result<(), EngineError>;

    /// Removes `id`. Succeeds whether or not the document existed.
    fn delete(&mut self, id: &str) -> Result<(), EngineError>;

    /// Runs a query-string search and returns matching ids in ranking order.
    fn search(&self, query: &str) -> Result<Vec<String>, EngineError>;

    fn doc_count(&self) -> Result<u64, EngineError>;

    /// Returns the retained source of `id`, or `None` when absent or not retained.
    fn get_stored(&self, id: &str) -> Result<Option<Vec<u8>>, EngineError>;

    /// Closes the engine. Consuming the box makes a second close impossible.
    fn close(self: Box<Self>) -> Result<(), EngineError>;
}
