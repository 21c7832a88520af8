//! Full-text search indexes as a key value kind.
//!
//! Loading [`create_module`] into a [`kvfts_core::Host`] registers the
//! `kvfts-idx` data type and the FT.* commands. A key created with FT.CREATE
//! holds an [`IndexHandle`] that owns one engine and its on-disk directory.
//!
//! # Lifecycle
//!
//! - FT.CREATE on an empty key allocates a fresh directory and opens an engine.
//!   On a key that already holds an index it succeeds without touching it.
//! - FT.INDEX / FT.DEL mutate the bound engine in place.
//! - When the key leaves the keyspace the host calls the type's free routine,
//!   which closes the engine and removes the directory.
//!
//! # Limitations
//!
//! - No snapshot load/save: index contents do not survive a restart, and a
//!   process that exits without shutting the host down leaves directories behind.
//! - Write commands replicate verbatim. A replica allocates its own directory,
//!   so only the logical index contents converge, not their location.

mod commands;
pub mod config;
pub mod datatype;
pub mod engine;
pub mod handle;

pub use config::SearchConfig;
pub use engine::{DocumentMapping, EngineFactory, IndexEngine, TantivyFactory};
pub use handle::IndexHandle;

use kvfts_core::{CommandError, Module, ModuleError, ModuleType};
use std::sync::{Arc, OnceLock};

pub const MODULE_NAME: &str = "kvfts";
pub const MODULE_VERSION: i32 = 1;
pub const MODULE_SEMVER: &str = "0.1.0";
pub const MODULE_WEBSITE: &str = env!("CARGO_PKG_HOMEPAGE");

/// State shared by every FT.* command of one loaded module.
pub(crate) struct SearchModule {
    pub(crate) config: SearchConfig,
    pub(crate) factory: Box<dyn EngineFactory>,
    index_type: OnceLock<ModuleType>,
}

impl SearchModule {
    /// Runtime handle of `kvfts-idx`, available once the host has run `after_init`.
    pub(crate) fn index_type(&self) -> Result<ModuleType, CommandError> {
        self.index_type
            .get()
            .copied()
            .ok_or_else(|| CommandError::err("module not initialized"))
    }

    pub(crate) fn mapping(&self) -> DocumentMapping {
        DocumentMapping {
            store_source: self.config.index.with_source,
        }
    }
}

/// Builds the module with the tantivy engine.
pub fn create_module(config: SearchConfig) -> Result<Module, ModuleError> {
    let factory = TantivyFactory::new(&config.engine);
    create_module_with_engine(config, Box::new(factory))
}

/// Builds the module with a caller-supplied engine.
///
/// Invalid config values are replaced with their defaults.
pub fn create_module_with_engine(
    config: SearchConfig,
    factory: Box<dyn EngineFactory>,
) -> Result<Module, ModuleError> {
    for problem in config.validate() {
        tracing::warn!("Invalid search config, using default: {}", problem);
    }

    let state = Arc::new(SearchModule {
        config: config.with_defaults_for_invalid(),
        factory,
        index_type: OnceLock::new(),
    });

    let mut builder = Module::builder(MODULE_NAME)
        .version(MODULE_VERSION)
        .semver(MODULE_SEMVER)
        .author("kvfts contributors")
        .website(MODULE_WEBSITE)
        .description("Full-text search indexes stored under keys")
        .data_type(datatype::data_type());
    for spec in commands::commands(&state)? {
        builder = builder.command(spec);
    }

    builder
        .after_init(move |ctx, _args| {
            let index_type = ctx.module_type(datatype::TYPE_NAME).ok_or_else(|| {
                ModuleError::Init(format!("data type {} not registered", datatype::TYPE_NAME))
            })?;
            state
                .index_type
                .set(index_type)
                .map_err(|_| ModuleError::Init("module already initialized".to_string()))?;
            tracing::debug!("Resolved {} to {:?}", datatype::TYPE_NAME, index_type);
            Ok(())
        })
        .build()
}

#[cfg(test)]
mod test_support;
