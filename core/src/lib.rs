//! In-process key-value host with a module API for custom value kinds.
//!
//! Modules declare data types and commands through [`ModuleBuilder`] and are
//! loaded once with [`Host::load_module`]. Commands run one at a time to
//! completion; each gets a [`Context`] that hands out read or write key handles.

pub mod context;
pub mod error;
pub mod host;
pub mod keyspace;
pub mod module;
pub mod reply;
pub mod types;

pub use context::{Context, LoadContext};
pub use error::{CommandError, CommandResult};
pub use host::Host;
pub use keyspace::{KeyType, ReadKey, WriteKey};
pub use module::error::ModuleError;
pub use module::{
    CommandFlags, CommandSpec, DataType, Module, ModuleBuilder, ModuleInfo, ModuleType,
};
pub use reply::Reply;
pub use types::{Key, KeyError};
