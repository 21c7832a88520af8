//! Built-in string commands and key management.

use crate::context::Context;
use crate::error::{CommandError, CommandResult};
use crate::keyspace::KeyType;
use crate::module::{CommandFlags, CommandSpec};
use crate::reply::Reply;
use crate::types::Key;

const WRITE: CommandFlags = CommandFlags {
    write: true,
    readonly: false,
    fast: false,
    deny_oom: false,
};

const READONLY: CommandFlags = CommandFlags {
    write: false,
    readonly: true,
    fast: true,
    deny_oom: false,
};

pub(super) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::with_flags(
            "set",
            CommandFlags {
                deny_oom: true,
                ..WRITE
            },
            set,
        )
        .keys(1, 1, 1)
        .usage("SET key value")
        .description("Stores a string, replacing any value."),
        CommandSpec::with_flags("get", READONLY, get)
            .keys(1, 1, 1)
            .usage("GET key")
            .description("Returns the string stored at key."),
        CommandSpec::with_flags("del", WRITE, del)
            .keys(1, -1, 1)
            .usage("DEL key [key ...]")
            .description("Removes keys and releases their values."),
        CommandSpec::with_flags("exists", READONLY, exists)
            .keys(1, -1, 1)
            .usage("EXISTS key [key ...]")
            .description("Counts the given keys that hold a value."),
        CommandSpec::with_flags("type", READONLY, key_type)
            .keys(1, 1, 1)
            .usage("TYPE key")
            .description("Names the kind of value stored at key."),
        CommandSpec::with_flags("flushall", WRITE, flushall)
            .usage("FLUSHALL")
            .description("Removes every key."),
    ]
}

fn set(ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    if args.len() != 3 {
        return Err(CommandError::WrongArity);
    }
    let key = Key::parse(&args[1])?;
    ctx.open_key_writable(&key)?.set_string(args[2].as_str());
    ctx.replicate_verbatim();
    Ok(Reply::Ok)
}

fn get(ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    if args.len() != 2 {
        return Err(CommandError::WrongArity);
    }
    let key = Key::parse(&args[1])?;
    let reply = match ctx.open_key(&key).string_value()? {
        Some(value) => Reply::simple(value),
        None => Reply::Null,
    };
    Ok(reply)
}

fn del(ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    if args.len() < 2 {
        return Err(CommandError::WrongArity);
    }
    let keys = args[1..]
        .iter()
        .map(|raw| Key::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut removed = 0;
    for key in &keys {
        if ctx.open_key_writable(key)?.delete() {
            removed += 1;
        }
    }
    ctx.replicate_verbatim();
    Ok(Reply::Integer(removed))
}

fn exists(ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    if args.len() < 2 {
        return Err(CommandError::WrongArity);
    }
    let mut found = 0;
    for raw in &args[1..] {
        let key = Key::parse(raw)?;
        if !ctx.open_key(&key).is_empty() {
            found += 1;
        }
    }
    Ok(Reply::Integer(found))
}

fn key_type(ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    if args.len() != 2 {
        return Err(CommandError::WrongArity);
    }
    let key = Key::parse(&args[1])?;
    let name = match ctx.open_key(&key).key_type() {
        KeyType::Empty => "none",
        KeyType::String => "string",
        KeyType::Module(module_type) => ctx.type_name(module_type).unwrap_or("unknown"),
    };
    Ok(Reply::simple(name))
}

fn flushall(ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    if args.len() != 1 {
        return Err(CommandError::WrongArity);
    }
    let released = ctx.flush_all()?;
    tracing::debug!("FLUSHALL released {} keys", released);
    ctx.replicate_verbatim();
    Ok(Reply::Ok)
}
