//! Per-invocation command context and the module load context.

use crate::error::CommandError;
use crate::host::TypeRegistry;
use crate::keyspace::{Keyspace, ReadKey, WriteKey};
use crate::module::ModuleType;
use crate::types::Key;

/// Scoped to one command invocation. Key handles borrow from it and are released
/// when they go out of scope, on every exit path of the handler.
pub struct Context<'a> {
    command: &'a str,
    write: bool,
    keyspace: &'a mut Keyspace,
    types: &'a TypeRegistry,
    replicate: bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        command: &'a str,
        write: bool,
        keyspace: &'a mut Keyspace,
        types: &'a TypeRegistry,
    ) -> Self {
        Self {
            command,
            write,
            keyspace,
            types,
            replicate: false,
        }
    }

    /// Lowercase name of the running command.
    pub fn command(&self) -> &str {
        self.command
    }

    pub fn open_key(&self, key: &Key) -> ReadKey<'_> {
        ReadKey::new(&*self.keyspace, key)
    }

    /// Only commands registered with the `write` flag may open keys for writing.
    pub fn open_key_writable(&mut self, key: &Key) -> Result<WriteKey<'_>, CommandError> {
        if !self.write {
            return Err(CommandError::err(format!("'{}' is not a write command", self.command)));
        }
        Ok(WriteKey::new(&mut *self.keyspace, self.types, key))
    }

    pub fn module_type(&self, name: &str) -> Option<ModuleType> {
        self.types.lookup(name)
    }

    /// Name of the data type registered under `module_type`.
    pub fn type_name(&self, module_type: ModuleType) -> Option<&str> {
        self.types.name(module_type)
    }

    /// Removes every key, releasing all values.
    pub(crate) fn flush_all(&mut self) -> Result<usize, CommandError> {
        if !self.write {
            return Err(CommandError::err(format!("'{}' is not a write command", self.command)));
        }
        Ok(self.keyspace.clear())
    }

    /// Requests that this invocation is sent verbatim to replicas once it succeeds.
    pub fn replicate_verbatim(&mut self) {
        self.replicate = true;
    }

    pub(crate) fn should_replicate(&self) -> bool {
        self.replicate
    }
}

/// Handed to a module's `after_init` hook.
pub struct LoadContext<'a> {
    types: &'a TypeRegistry,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(types: &'a TypeRegistry) -> Self {
        Self { types }
    }

    /// Resolves a registered data type name to its runtime handle.
    pub fn module_type(&self, name: &str) -> Option<ModuleType> {
        self.types.lookup(name)
    }
}
