//! Module API: data type descriptors, command specs and the module descriptor.
//!
//! A [`Module`] is assembled once by [`ModuleBuilder`] and is immutable afterwards.
//! The host consumes it in [`crate::Host::load_module`].

use crate::context::{Context, LoadContext};
use crate::error::CommandResult;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;

mod flags;

pub use flags::CommandFlags;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ModuleError {
        #[error("Invalid module name")]
        InvalidModuleName,

        #[error("Invalid data type name '{0}': expected 9 characters of [A-Za-z0-9_-]")]
        InvalidTypeName(String),

        #[error("Data type already registered: {0}")]
        DuplicateType(String),

        #[error("Command already registered: {0}")]
        DuplicateCommand(String),

        #[error("Invalid command flag: {0}")]
        InvalidFlag(String),

        #[error("Module initialization failed: {0}")]
        Init(String),
    }
}

use error::ModuleError;

/// Release routine for a module value. Called exactly once when the value leaves the keyspace.
pub type FreeFn = fn(Box<dyn Any + Send>);

pub type CommandHandler =
    Box<dyn Fn(&mut Context<'_>, &[String]) -> CommandResult + Send + Sync + 'static>;

pub type AfterInitHook =
    Box<dyn FnOnce(&LoadContext<'_>, &[String]) -> Result<(), ModuleError> + Send + 'static>;

/// Runtime handle of a registered data type, used to type-check keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleType(pub(crate) u32);

/// Declares a custom value kind to the host.
#[derive(Debug, Clone)]
pub struct DataType {
    pub name: String,
    pub encoding_version: i32,
    pub free: FreeFn,
    pub description: String,
}

impl DataType {
    pub const NAME_LEN: usize = 9;

    pub fn new(name: impl Into<String>, encoding_version: i32, free: FreeFn) -> Self {
        Self {
            name: name.into(),
            encoding_version,
            free,
            description: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn validate_name(name: &str) -> Result<(), ModuleError> {
        let valid = name.chars().count() == Self::NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(ModuleError::InvalidTypeName(name.to_string()))
        }
    }
}

pub struct CommandSpec {
    name: String,
    usage: String,
    description: String,
    flags: CommandFlags,
    first_key: i32,
    last_key: i32,
    key_step: i32,
    handler: CommandHandler,
}

impl CommandSpec {
    /// `flags` is a space separated flag string such as `"fast write deny-oom"`.
    pub fn new<F>(name: &str, flags: &str, handler: F) -> Result<Self, ModuleError>
    where
        F: Fn(&mut Context<'_>, &[String]) -> CommandResult + Send + Sync + 'static,
    {
        Ok(Self::with_flags(name, CommandFlags::parse(flags)?, handler))
    }

    pub(crate) fn with_flags<F>(name: &str, flags: CommandFlags, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, &[String]) -> CommandResult + Send + Sync + 'static,
    {
        Self {
            name: name.to_ascii_lowercase(),
            usage: String::new(),
            description: String::new(),
            flags,
            first_key: 0,
            last_key: 0,
            key_step: 0,
            handler: Box::new(handler),
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Key positions in argv. A negative `last_key` counts from the end.
    pub fn keys(mut self, first_key: i32, last_key: i32, key_step: i32) -> Self {
        self.first_key = first_key;
        self.last_key = last_key;
        self.key_step = key_step;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn flags(&self) -> CommandFlags {
        self.flags
    }

    pub fn is_write(&self) -> bool {
        self.flags.write
    }

    /// Returns the key arguments of `argv` according to the declared key positions.
    pub fn key_args<'a>(&self, argv: &'a [String]) -> Vec<&'a str> {
        if self.first_key <= 0 || self.key_step <= 0 {
            return Vec::new();
        }

        let argc = argv.len() as i64;
        let last = if self.last_key < 0 {
            argc + i64::from(self.last_key)
        } else {
            i64::from(self.last_key)
        };

        (i64::from(self.first_key)..=last.min(argc - 1))
            .step_by(self.key_step as usize)
            .map(|i| argv[i as usize].as_str())
            .collect()
    }

    pub(crate) fn call(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
        (self.handler)(ctx, args)
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("first_key", &self.first_key)
            .field("last_key", &self.last_key)
            .field("key_step", &self.key_step)
            .finish_non_exhaustive()
    }
}

/// Immutable module descriptor handed to the host once at startup.
pub struct Module {
    name: String,
    version: i32,
    semver: String,
    author: String,
    website: Option<String>,
    description: String,
    commands: Vec<CommandSpec>,
    data_types: Vec<DataType>,
    after_init: Option<AfterInitHook>,
}

pub(crate) struct ModuleParts {
    pub(crate) info: ModuleInfo,
    pub(crate) commands: Vec<CommandSpec>,
    pub(crate) data_types: Vec<DataType>,
    pub(crate) after_init: Option<AfterInitHook>,
}

/// Metadata of a loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub version: i32,
    pub semver: String,
    pub author: String,
    pub website: Option<String>,
    pub description: String,
}

impl Module {
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            version: 1,
            semver: String::from("0.0.0"),
            author: String::new(),
            website: None,
            description: String::new(),
            commands: Vec::new(),
            data_types: Vec::new(),
            after_init: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn semver(&self) -> &str {
        &self.semver
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    pub(crate) fn into_parts(self) -> ModuleParts {
        ModuleParts {
            info: ModuleInfo {
                name: self.name,
                version: self.version,
                semver: self.semver,
                author: self.author,
                website: self.website,
                description: self.description,
            },
            commands: self.commands,
            data_types: self.data_types,
            after_init: self.after_init,
        }
    }
}

pub struct ModuleBuilder {
    name: String,
    version: i32,
    semver: String,
    author: String,
    website: Option<String>,
    description: String,
    commands: Vec<CommandSpec>,
    data_types: Vec<DataType>,
    after_init: Option<AfterInitHook>,
}

impl ModuleBuilder {
    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn semver(mut self, semver: impl Into<String>) -> Self {
        self.semver = semver.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_types.push(data_type);
        self
    }

    pub fn command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    /// Hook run by the host after the data types are registered and before any command executes.
    pub fn after_init<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&LoadContext<'_>, &[String]) -> Result<(), ModuleError> + Send + 'static,
    {
        self.after_init = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<Module, ModuleError> {
        if self.name.trim().is_empty() {
            return Err(ModuleError::InvalidModuleName);
        }

        let mut type_names = HashSet::new();
        for data_type in &self.data_types {
            DataType::validate_name(&data_type.name)?;
            if !type_names.insert(data_type.name.as_str()) {
                return Err(ModuleError::DuplicateType(data_type.name.clone()));
            }
        }

        let mut command_names = HashSet::new();
        for command in &self.commands {
            if !command_names.insert(command.name()) {
                return Err(ModuleError::DuplicateCommand(command.name().to_string()));
            }
        }

        Ok(Module {
            name: self.name,
            version: self.version,
            semver: self.semver,
            author: self.author,
            website: self.website,
            description: self.description,
            commands: self.commands,
            data_types: self.data_types,
            after_init: self.after_init,
        })
    }
}
