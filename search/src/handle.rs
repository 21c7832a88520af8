//! The value a key holds once an index has been created on it.
//!
//! An [`IndexHandle`] exclusively owns one open engine and the directory the
//! engine writes into. Both are released together, once.

use crate::engine::{DocumentMapping, EngineFactory, IndexEngine};
use std::path::{Path, PathBuf};

pub mod error {
    use crate::engine::error::EngineError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum HandleError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error(transparent)]
        Engine(#[from] EngineError),

        #[error("Index already released")]
        Released,
    }
}

use error::HandleError;

/// Longest index name carried into a directory prefix.
const MAX_PREFIX_NAME_LEN: usize = 64;

pub struct IndexHandle {
    name: String,
    path: PathBuf,
    engine: Option<Box<dyn IndexEngine>>,
    with_source: bool,
    dir_removed: bool,
}

impl IndexHandle {
    /// Allocates a fresh directory under `root` and opens an engine in it.
    ///
    /// `root` is created if missing. If the engine fails to open, the directory
    /// is removed before the error is returned.
    pub fn create(
        name: &str,
        root: &Path,
        factory: &dyn EngineFactory,
        mapping: DocumentMapping,
    ) -> Result<Self, HandleError> {
        std::fs::create_dir_all(root)?;
        let path = tempfile::Builder::new()
            .prefix(&format!("kvfts-idx-{}-", sanitize_name(name)))
            .tempdir_in(root)?
            .keep();

        let engine = match factory.create(&path, &mapping) {
            Ok(engine) => engine,
            Err(err) => {
                if let Err(remove_err) = std::fs::remove_dir_all(&path) {
                    tracing::warn!(
                        "Failed to remove {} after engine open failed: {}",
                        path.display(),
                        remove_err
                    );
                }
                return Err(err.into());
            }
        };

        tracing::debug!("Created index {} at {}", name, path.display());
        Ok(Self {
            name: name.to_string(),
            path,
            engine: Some(engine),
            with_source: mapping.store_source,
            dir_removed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_source(&self) -> bool {
        self.with_source
    }

    pub fn is_released(&self) -> bool {
        self.engine.is_none()
    }

    fn engine(&self) -> Result<&dyn IndexEngine, HandleError> {
        self.engine.as_deref().ok_or(HandleError::Released)
    }

    fn engine_mut(&mut self) -> Result<&mut (dyn IndexEngine + 'static), HandleError> {
        self.engine.as_deref_mut().ok_or(HandleError::Released)
    }
}

/// Document operations, forwarded to the engine.
impl IndexHandle {
    pub fn index(&mut self, id: &str, doc: &str) -> Result<(), HandleError> {
        Ok(self.engine_mut()?.index(id, doc)?)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), HandleError> {
        Ok(self.engine_mut()?.delete(id)?)
    }

    pub fn search(&self, query: &str) -> Result<Vec<String>, HandleError> {
        Ok(self.engine()?.search(query)?)
    }

    pub fn doc_count(&self) -> Result<u64, HandleError> {
        Ok(self.engine()?.doc_count()?)
    }

    /// Retained source of `id`. Always `None` when the index does not retain source.
    pub fn get_stored(&self, id: &str) -> Result<Option<Vec<u8>>, HandleError> {
        if !self.with_source {
            return Ok(None);
        }
        Ok(self.engine()?.get_stored(id)?)
    }
}

/// Release.
impl IndexHandle {
    /// Closes the engine, then removes the directory.
    ///
    /// Safe to call any number of times: the engine is closed at most once and
    /// the directory removed at most once. Failures are logged, never returned.
    pub fn release(&mut self) {
        if let Some(engine) = self.engine.take() {
            if let Err(err) = engine.close() {
                tracing::warn!("Failed to close index {}: {}", self.name, err);
            }
        }

        if !self.dir_removed {
            self.dir_removed = true;
            match std::fs::remove_dir_all(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => tracing::warn!(
                    "Failed to remove index directory {}: {}",
                    self.path.display(),
                    err
                ),
            }
        }
    }
}

impl Drop for IndexHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("with_source", &self.with_source)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Keeps `[A-Za-z0-9_-]`, replaces everything else with `_`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .take(MAX_PREFIX_NAME_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
