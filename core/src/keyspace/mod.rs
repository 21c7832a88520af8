//! The keyspace and the key handles commands use to reach it.
//!
//! A key holds at most one value. Module values carry the free routine of their
//! data type and run it exactly once when they leave the keyspace, whether by
//! delete, overwrite, eviction, flush or host shutdown.

use crate::error::CommandError;
use crate::host::TypeRegistry;
use crate::module::{FreeFn, ModuleType};
use crate::types::Key;
use std::any::Any;
use std::collections::HashMap;

pub(crate) enum StoredValue {
    String(String),
    Module(ModuleValue),
}

pub(crate) struct ModuleValue {
    module_type: ModuleType,
    data: Option<Box<dyn Any + Send>>,
    free: FreeFn,
}

impl ModuleValue {
    fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.as_ref().and_then(|data| data.downcast_ref::<T>())
    }

    fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_mut().and_then(|data| data.downcast_mut::<T>())
    }
}

impl Drop for ModuleValue {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            (self.free)(data);
        }
    }
}

/// What kind of value a key currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Empty,
    String,
    Module(ModuleType),
}

#[derive(Default)]
pub(crate) struct Keyspace {
    entries: HashMap<Key, StoredValue>,
}

impl Keyspace {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&StoredValue> {
        self.entries.get(key)
    }

    /// Removes the key, releasing its value. Returns whether the key existed.
    pub(crate) fn remove(&mut self, key: &Key) -> bool {
        self.entries.remove(key).is_some()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}

fn key_type(value: Option<&StoredValue>) -> KeyType {
    match value {
        None => KeyType::Empty,
        Some(StoredValue::String(_)) => KeyType::String,
        Some(StoredValue::Module(m)) => KeyType::Module(m.module_type),
    }
}

fn string_value(value: Option<&StoredValue>) -> Result<Option<&str>, CommandError> {
    match value {
        None => Ok(None),
        Some(StoredValue::String(s)) => Ok(Some(s.as_str())),
        Some(StoredValue::Module(_)) => Err(CommandError::WrongType),
    }
}

fn module_value<T: Any>(
    value: Option<&StoredValue>,
    module_type: ModuleType,
) -> Result<Option<&T>, CommandError> {
    match value {
        None => Ok(None),
        Some(StoredValue::Module(m)) if m.module_type == module_type => m
            .downcast_ref::<T>()
            .map(Some)
            .ok_or(CommandError::WrongType),
        Some(_) => Err(CommandError::WrongType),
    }
}

/// Key opened in read mode.
pub struct ReadKey<'a> {
    key: Key,
    value: Option<&'a StoredValue>,
}

impl<'a> ReadKey<'a> {
    pub(crate) fn new(keyspace: &'a Keyspace, key: &Key) -> Self {
        Self {
            key: key.clone(),
            value: keyspace.get(key),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn key_type(&self) -> KeyType {
        key_type(self.value)
    }

    pub fn string_value(&self) -> Result<Option<&str>, CommandError> {
        string_value(self.value)
    }

    /// Typed access to a module value.
    ///
    /// Returns `Ok(None)` for an empty key and `Err(WrongType)` when the key
    /// holds anything other than a `T` registered under `module_type`.
    pub fn module_value<T: Any>(
        &self,
        module_type: ModuleType,
    ) -> Result<Option<&T>, CommandError> {
        module_value(self.value, module_type)
    }
}

/// Key opened in write mode.
pub struct WriteKey<'a> {
    key: Key,
    entries: &'a mut HashMap<Key, StoredValue>,
    types: &'a TypeRegistry,
}

impl<'a> WriteKey<'a> {
    pub(crate) fn new(keyspace: &'a mut Keyspace, types: &'a TypeRegistry, key: &Key) -> Self {
        Self {
            key: key.clone(),
            entries: &mut keyspace.entries,
            types,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        !self.entries.contains_key(&self.key)
    }

    pub fn key_type(&self) -> KeyType {
        key_type(self.entries.get(&self.key))
    }

    pub fn string_value(&self) -> Result<Option<&str>, CommandError> {
        string_value(self.entries.get(&self.key))
    }

    pub fn module_value<T: Any>(
        &self,
        module_type: ModuleType,
    ) -> Result<Option<&T>, CommandError> {
        module_value(self.entries.get(&self.key), module_type)
    }

    pub fn module_value_mut<T: Any>(
        &mut self,
        module_type: ModuleType,
    ) -> Result<Option<&mut T>, CommandError> {
        match self.entries.get_mut(&self.key) {
            None => Ok(None),
            Some(StoredValue::Module(m)) if m.module_type == module_type => m
                .downcast_mut::<T>()
                .map(Some)
                .ok_or(CommandError::WrongType),
            Some(_) => Err(CommandError::WrongType),
        }
    }

    /// Stores a string, releasing any previous value.
    pub fn set_string(&mut self, value: impl Into<String>) {
        self.entries
            .insert(self.key.clone(), StoredValue::String(value.into()));
    }

    /// Binds a module value to the key, releasing any previous value.
    ///
    /// If `module_type` is unknown the value is dropped and an error is returned.
    pub fn set_module_value<T: Any + Send>(
        &mut self,
        module_type: ModuleType,
        value: T,
    ) -> Result<(), CommandError> {
        let free = self
            .types
            .free_fn(module_type)
            .ok_or_else(|| CommandError::err("module type not registered"))?;

        let value = ModuleValue {
            module_type,
            data: Some(Box::new(value)),
            free,
        };
        self.entries
            .insert(self.key.clone(), StoredValue::Module(value));
        Ok(())
    }

    /// Removes the key, releasing its value. Returns whether the key existed.
    pub fn delete(&mut self) -> bool {
        self.entries.remove(&self.key).is_some()
    }
}

#[cfg(test)]
mod tests;
