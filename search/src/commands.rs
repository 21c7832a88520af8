//! FT.* command handlers.
//!
//! Each handler checks arity, opens the key in the mode its flags allow,
//! type-checks it and forwards to the bound [`IndexHandle`]. Engine failures
//! are logged with their cause and answered with a generic error.

use crate::SearchModule;
use crate::engine::error::EngineError;
use crate::handle::IndexHandle;
use crate::handle::error::HandleError;
use kvfts_core::{CommandError, CommandResult, CommandSpec, Context, Key, ModuleError, Reply};
use std::sync::Arc;

const WRITE_FLAGS: &str = "fast write deny-oom";
const READ_FLAGS: &str = "fast deny-oom";

type Handler = fn(&SearchModule, &mut Context<'_>, &[String]) -> CommandResult;

pub(crate) fn commands(module: &Arc<SearchModule>) -> Result<Vec<CommandSpec>, ModuleError> {
    Ok(vec![
        command(module, "ft.create", WRITE_FLAGS, create)?
            .usage("FT.CREATE index")
            .description("Creates an index on the key, or keeps the existing one."),
        command(module, "ft.index", WRITE_FLAGS, index)?
            .usage("FT.INDEX index doc-id doc")
            .description("Adds or replaces a document."),
        command(module, "ft.del", WRITE_FLAGS, delete)?
            .usage("FT.DEL index doc-id")
            .description("Removes a document."),
        command(module, "ft.get", READ_FLAGS, get)?
            .usage("FT.GET index doc-id")
            .description("Returns the stored source of a document."),
        command(module, "ft.count", READ_FLAGS, count)?
            .usage("FT.COUNT index")
            .description("Returns the number of indexed documents."),
        command(module, "ft.query", READ_FLAGS, query)?
            .usage("FT.QUERY index query-string")
            .description("Runs a query-string search and returns matching document ids."),
    ])
}

fn command(
    module: &Arc<SearchModule>,
    name: &str,
    flags: &str,
    handler: Handler,
) -> Result<CommandSpec, ModuleError> {
    let module = Arc::clone(module);
    let spec = CommandSpec::new(name, flags, move |ctx: &mut Context<'_>, args: &[String]| {
        handler(&module, ctx, args)
    })?;
    Ok(spec.keys(1, 1, 1))
}

fn index_not_found() -> CommandError {
    CommandError::err("Index not exists")
}

/// Logs `err` against `key` and returns the generic `reply` for it.
fn transient<'a>(
    key: &'a Key,
    reply: &'static str,
) -> impl FnOnce(HandleError) -> CommandError + 'a {
    move |err| {
        tracing::warn!("{} on {}: {}", reply, key, err);
        CommandError::err(reply)
    }
}

fn create(module: &SearchModule, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    let [_, name] = args else {
        return Err(CommandError::WrongArity);
    };
    let index_type = module.index_type()?;
    let key = Key::parse(name)?;

    {
        let mut slot = ctx.open_key_writable(&key)?;
        if slot.module_value::<IndexHandle>(index_type)?.is_some() {
            tracing::debug!("Index {} already exists, reusing it", key);
        } else {
            let handle = IndexHandle::create(
                name,
                &module.config.index.root,
                module.factory.as_ref(),
                module.mapping(),
            )
            .map_err(transient(&key, "Failed to create index"))?;
            slot.set_module_value(index_type, handle)?;
        }
    }

    ctx.replicate_verbatim();
    Ok(Reply::Ok)
}

fn index(module: &SearchModule, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    let [_, name, id, doc] = args else {
        return Err(CommandError::WrongArity);
    };
    let index_type = module.index_type()?;
    let key = Key::parse(name)?;

    {
        let mut slot = ctx.open_key_writable(&key)?;
        let handle = slot
            .module_value_mut::<IndexHandle>(index_type)?
            .ok_or_else(index_not_found)?;
        handle
            .index(id, doc)
            .map_err(transient(&key, "Failed to index doc"))?;
    }

    ctx.replicate_verbatim();
    Ok(Reply::Ok)
}

/// Replies 1 whenever the engine call succeeds, whether or not the document existed.
fn delete(module: &SearchModule, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    let [_, name, id] = args else {
        return Err(CommandError::WrongArity);
    };
    let index_type = module.index_type()?;
    let key = Key::parse(name)?;

    {
        let mut slot = ctx.open_key_writable(&key)?;
        let handle = slot
            .module_value_mut::<IndexHandle>(index_type)?
            .ok_or_else(index_not_found)?;
        handle
            .delete(id)
            .map_err(transient(&key, "Failed to delete doc"))?;
    }

    ctx.replicate_verbatim();
    Ok(Reply::Integer(1))
}

fn get(module: &SearchModule, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    let [_, name, id] = args else {
        return Err(CommandError::WrongArity);
    };
    let index_type = module.index_type()?;
    let key = Key::parse(name)?;

    let slot = ctx.open_key(&key);
    let Some(handle) = slot.module_value::<IndexHandle>(index_type)? else {
        return Ok(Reply::Null);
    };
    let stored = handle
        .get_stored(id)
        .map_err(transient(&key, "Failed to get doc"))?;

    Ok(match stored {
        Some(bytes) => Reply::SimpleString(String::from_utf8_lossy(&bytes).into_owned()),
        None => Reply::Null,
    })
}

fn count(module: &SearchModule, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    let [_, name] = args else {
        return Err(CommandError::WrongArity);
    };
    let index_type = module.index_type()?;
    let key = Key::parse(name)?;

    let slot = ctx.open_key(&key);
    let handle = slot
        .module_value::<IndexHandle>(index_type)?
        .ok_or_else(index_not_found)?;
    let count = handle
        .doc_count()
        .map_err(transient(&key, "Failed to get count"))?;

    Ok(Reply::Integer(i64::try_from(count).unwrap_or(i64::MAX)))
}

fn query(module: &SearchModule, ctx: &mut Context<'_>, args: &[String]) -> CommandResult {
    let [_, name, query] = args else {
        return Err(CommandError::WrongArity);
    };
    let index_type = module.index_type()?;
    let key = Key::parse(name)?;

    let slot = ctx.open_key(&key);
    let handle = slot
        .module_value::<IndexHandle>(index_type)?
        .ok_or_else(index_not_found)?;
    let ids = handle.search(query).map_err(|err| match err {
        HandleError::Engine(EngineError::QueryParse(_)) => {
            tracing::debug!("Rejected query {:?} on {}: {}", query, key, err);
            CommandError::err("Failed to parse query")
        }
        other => transient(&key, "Failed to query")(other),
    })?;

    Ok(Reply::strings(ids))
}
