use thiserror::Error;

pub type CommandResult = std::result::Result<crate::Reply, CommandError>;

/// Failure of a single command invocation. The host turns it into exactly one error reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("wrong number of arguments")]
    WrongArity,

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR {0}")]
    Err(String),
}

impl CommandError {
    pub fn err(msg: impl Into<String>) -> Self {
        CommandError::Err(msg.into())
    }

    /// Renders the error reply text for `command`.
    pub fn reply_message(&self, command: &str) -> String {
        match self {
            CommandError::WrongArity => {
                format!("ERR wrong number of arguments for '{command}' command")
            }
            other => other.to_string(),
        }
    }
}

impl From<crate::types::KeyError> for CommandError {
    fn from(err: crate::types::KeyError) -> Self {
        CommandError::Err(format!("invalid key: {err}"))
    }
}
