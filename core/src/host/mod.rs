//! In-process host store.
//!
//! Executes one command to completion before the next, so module values never
//! see concurrent access. Every invocation yields exactly one [`Reply`].

use crate::context::{Context, LoadContext};
use crate::keyspace::Keyspace;
use crate::module::error::ModuleError;
use crate::module::{CommandSpec, DataType, FreeFn, Module, ModuleInfo, ModuleType};
use crate::reply::Reply;
use crate::types::Key;
use std::collections::HashMap;

mod builtin;

pub const OOM_MESSAGE: &str = "OOM command not allowed when used memory > 'maxmemory'.";

struct TypeEntry {
    name: String,
    encoding_version: i32,
    free: FreeFn,
    description: String,
    module: String,
}

/// Registered data types. Handles are indexes and are never reused.
#[derive(Default)]
pub(crate) struct TypeRegistry {
    entries: Vec<Option<TypeEntry>>,
}

impl TypeRegistry {
    fn entry(&self, module_type: ModuleType) -> Option<&TypeEntry> {
        self.entries
            .get(module_type.0 as usize)
            .and_then(Option::as_ref)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<ModuleType> {
        self.entries.iter().enumerate().find_map(|(i, entry)| {
            entry
                .as_ref()
                .filter(|e| e.name == name)
                .map(|_| ModuleType(i as u32))
        })
    }

    pub(crate) fn name(&self, module_type: ModuleType) -> Option<&str> {
        self.entry(module_type).map(|e| e.name.as_str())
    }

    pub(crate) fn free_fn(&self, module_type: ModuleType) -> Option<FreeFn> {
        self.entry(module_type).map(|e| e.free)
    }

    pub(crate) fn encoding_version(&self, module_type: ModuleType) -> Option<i32> {
        self.entry(module_type).map(|e| e.encoding_version)
    }

    pub(crate) fn description(&self, module_type: ModuleType) -> Option<&str> {
        self.entry(module_type).map(|e| e.description.as_str())
    }

    pub(crate) fn register(&mut self, data_type: DataType, module: &str) -> ModuleType {
        self.entries.push(Some(TypeEntry {
            name: data_type.name,
            encoding_version: data_type.encoding_version,
            free: data_type.free,
            description: data_type.description,
            module: module.to_string(),
        }));
        ModuleType((self.entries.len() - 1) as u32)
    }

    fn unregister_module(&mut self, module: &str) {
        for slot in &mut self.entries {
            if slot.as_ref().is_some_and(|e| e.module == module) {
                *slot = None;
            }
        }
    }
}

struct RegisteredCommand {
    spec: CommandSpec,
    module: Option<String>,
}

pub struct Host {
    keyspace: Keyspace,
    types: TypeRegistry,
    commands: HashMap<String, RegisteredCommand>,
    modules: Vec<ModuleInfo>,
    replication: Vec<Vec<String>>,
    out_of_memory: bool,
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Host {
    pub fn new() -> Self {
        let commands = builtin::commands()
            .into_iter()
            .map(|spec| {
                (
                    spec.name().to_string(),
                    RegisteredCommand { spec, module: None },
                )
            })
            .collect();

        Self {
            keyspace: Keyspace::default(),
            types: TypeRegistry::default(),
            commands,
            modules: Vec::new(),
            replication: Vec::new(),
            out_of_memory: false,
        }
    }
}

/// Module loading.
impl Host {
    /// Registers the module's data types and commands, then runs its `after_init` hook.
    ///
    /// Nothing stays registered if the load fails.
    pub fn load_module(&mut self, module: Module, args: &[String]) -> Result<(), ModuleError> {
        let parts = module.into_parts();
        let module_name = parts.info.name.clone();

        if self.modules.iter().any(|m| m.name == module_name) {
            return Err(ModuleError::Init(format!("module '{module_name}' is already loaded")));
        }
        for data_type in &parts.data_types {
            if self.types.lookup(&data_type.name).is_some() {
                return Err(ModuleError::DuplicateType(data_type.name.clone()));
            }
        }
        for command in &parts.commands {
            if self.commands.contains_key(command.name()) {
                return Err(ModuleError::DuplicateCommand(command.name().to_string()));
            }
        }

        for data_type in parts.data_types {
            let name = data_type.name.clone();
            let module_type = self.types.register(data_type, &module_name);
            tracing::debug!("Registered data type {} as {:?}", name, module_type);
        }
        for spec in parts.commands {
            self.commands.insert(
                spec.name().to_string(),
                RegisteredCommand {
                    spec,
                    module: Some(module_name.clone()),
                },
            );
        }

        if let Some(hook) = parts.after_init {
            if let Err(err) = hook(&LoadContext::new(&self.types), args) {
                self.unload_registrations(&module_name);
                tracing::warn!("Failed to load module {}: {}", module_name, err);
                return Err(err);
            }
        }

        tracing::info!(
            "Loaded module {} v{} ({})",
            module_name,
            parts.info.version,
            parts.info.semver
        );
        self.modules.push(parts.info);
        Ok(())
    }

    fn unload_registrations(&mut self, module_name: &str) {
        self.commands
            .retain(|_, c| c.module.as_deref() != Some(module_name));
        self.types.unregister_module(module_name);
    }

    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands
            .get(&name.to_ascii_lowercase())
            .map(|c| &c.spec)
    }

    /// Every registered command, sorted by name.
    pub fn commands(&self) -> Vec<&CommandSpec> {
        let mut specs: Vec<&CommandSpec> = self.commands.values().map(|c| &c.spec).collect();
        specs.sort_by(|a, b| a.name().cmp(b.name()));
        specs
    }

    pub fn module_type(&self, name: &str) -> Option<ModuleType> {
        self.types.lookup(name)
    }

    pub fn encoding_version(&self, module_type: ModuleType) -> Option<i32> {
        self.types.encoding_version(module_type)
    }

    pub fn type_description(&self, module_type: ModuleType) -> Option<&str> {
        self.types.description(module_type)
    }
}

/// Command execution.
impl Host {
    pub fn execute<S: AsRef<str>>(&mut self, argv: &[S]) -> Reply {
        let argv: Vec<String> = argv.iter().map(|a| a.as_ref().to_string()).collect();

        let Some(first) = argv.first() else {
            return Reply::Error("ERR empty command".to_string());
        };
        let Some(registered) = self.commands.get(&first.to_ascii_lowercase()) else {
            return Reply::Error(format!("ERR unknown command '{first}'"));
        };
        let spec = &registered.spec;

        if spec.flags().deny_oom && self.out_of_memory {
            return Reply::Error(OOM_MESSAGE.to_string());
        }

        let mut ctx = Context::new(
            spec.name(),
            spec.is_write(),
            &mut self.keyspace,
            &self.types,
        );
        let result = spec.call(&mut ctx, &argv);
        let replicate = ctx.should_replicate();

        match result {
            Ok(reply) => {
                if replicate && spec.is_write() {
                    self.replication.push(argv.clone());
                }
                reply
            }
            Err(err) => Reply::Error(err.reply_message(spec.name())),
        }
    }

    /// Commands replicated so far, byte-identical to how they were received.
    pub fn replicated(&self) -> &[Vec<String>] {
        &self.replication
    }

    pub fn set_out_of_memory(&mut self, out_of_memory: bool) {
        self.out_of_memory = out_of_memory;
    }
}

/// Keyspace maintenance.
impl Host {
    pub fn dbsize(&self) -> usize {
        self.keyspace.len()
    }

    /// Evicts a key as memory pressure would, releasing its value.
    pub fn evict(&mut self, key: &Key) -> bool {
        self.keyspace.remove(key)
    }

    /// Releases every value. The host can be reused afterwards.
    pub fn shutdown(&mut self) {
        let released = self.keyspace.clear();
        tracing::info!("Shutdown released {} keys", released);
    }
}
