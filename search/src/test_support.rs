//! In-memory engine that records what the module asks of it.

use crate::engine::error::EngineError;
use crate::engine::{DocumentMapping, EngineFactory, IndexEngine};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tantivy::query::QueryParserError;

/// Id that makes `index` and `delete` fail.
pub(crate) const FAILING_ID: &str = "fail-me";

#[derive(Debug, Default)]
pub(crate) struct EngineLog {
    pub(crate) created: Vec<PathBuf>,
    pub(crate) closed: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeFactory {
    log: Arc<Mutex<EngineLog>>,
    fail_create: bool,
    fail_close: bool,
}

impl FakeFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_close() -> Self {
        Self {
            fail_close: true,
            ..Self::default()
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.log.lock().unwrap().created.len()
    }

    pub(crate) fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        self.log.lock().unwrap().created.clone()
    }
}

impl EngineFactory for FakeFactory {
    fn create(
        &self,
        path: &Path,
        mapping: &DocumentMapping,
    ) -> Result<Box<dyn IndexEngine>, EngineError> {
        if self.fail_create {
            return Err(EngineError::Io(std::io::Error::other("engine open failed")));
        }
        self.log.lock().unwrap().created.push(path.to_path_buf());
        Ok(Box::new(FakeEngine {
            docs: BTreeMap::new(),
            store_source: mapping.store_source,
            log: Arc::clone(&self.log),
            fail_close: self.fail_close,
        }))
    }
}

struct FakeEngine {
    docs: BTreeMap<String, String>,
    store_source: bool,
    log: Arc<Mutex<EngineLog>>,
    fail_close: bool,
}

fn write_failure(id: &str) -> Result<(), EngineError> {
    if id == FAILING_ID {
        return Err(EngineError::Io(std::io::Error::other("disk full")));
    }
    Ok(())
}

impl IndexEngine for FakeEngine {
    fn index(&mut self, id: &str, doc: &str) -> Result<(), EngineError> {
        write_failure(id)?;
        self.docs.insert(id.to_string(), doc.to_string());
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), EngineError> {
        write_failure(id)?;
        self.docs.remove(id);
        Ok(())
    }

    /// Matches documents sharing any whitespace-separated term with the query.
    fn search(&self, query: &str) -> Result<Vec<String>, EngineError> {
        if query.starts_with(':') {
            return Err(QueryParserError::SyntaxError(query.to_string()).into());
        }
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        Ok(self
            .docs
            .iter()
            .filter(|(_, doc)| {
                doc.split_whitespace()
                    .any(|word| terms.contains(&word.to_lowercase()))
            })
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn doc_count(&self) -> Result<u64, EngineError> {
        Ok(self.docs.len() as u64)
    }

    fn get_stored(&self, id: &str) -> Result<Option<Vec<u8>>, EngineError> {
        if !self.store_source {
            return Ok(None);
        }
        Ok(self.docs.get(id).map(|doc| doc.as_bytes().to_vec()))
    }

    fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.log.lock().unwrap().closed += 1;
        if self.fail_close {
            return Err(EngineError::Io(std::io::Error::other("close failed")));
        }
        Ok(())
    }
}

/// Number of entries directly under `dir`, zero if it does not exist.
pub(crate) fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
