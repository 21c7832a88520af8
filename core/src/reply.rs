//! Replies produced by command handlers.

use std::fmt;

/// A single reply to one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Simple status `OK`.
    Ok,
    SimpleString(String),
    Integer(i64),
    Null,
    /// Length-prefixed array of nested replies.
    Array(Vec<Reply>),
    Error(String),
}

impl Reply {
    pub fn simple(value: impl Into<String>) -> Self {
        Reply::SimpleString(value.into())
    }

    /// Array of simple strings, as returned for lists of identifiers.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Reply::Array(items.into_iter().map(Reply::simple).collect())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::SimpleString(s) => write!(f, "{s}"),
            Reply::Integer(n) => write!(f, "(integer) {n}"),
            Reply::Null => write!(f, "(nil)"),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {item}", i + 1)?;
                }
                Ok(())
            }
            Reply::Error(msg) => write!(f, "(error) {msg}"),
        }
    }
}
