//! Command handlers and the values they return.

use serde::Serialize;
use thiserror::Error;

use crate::principal::CallerPrincipal;

/// Result value produced by a command handler.
///
/// The gate forwards replies untouched. On the wire each variant serialises
/// to its natural JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Status text such as `OK` or `PONG`.
    Status(String),
    /// Arbitrary string payload.
    Bulk(String),
    /// Signed integer.
    Integer(i64),
    /// Ordered list of nested replies.
    Array(Vec<Self>),
    /// Absent value.
    Nil,
}

impl Reply {
    /// The `OK` status reply.
    #[must_use]
    pub fn ok() -> Self {
        Self::Status("OK".to_owned())
    }

    /// Array of bulk strings.
    #[must_use]
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(items.into_iter().map(|item| Self::Bulk(item.into())).collect())
    }
}

/// Failure raised by a handler after the gate forwarded the call.
///
/// The message is sent to the client verbatim and should carry its own
/// error-code prefix such as `ERR`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Builds an error from a complete wire message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wire message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type returned by handlers.
pub type HandlerResult = Result<Reply, HandlerError>;

/// A call that passed every gate check.
#[derive(Debug)]
pub struct Invocation<'a> {
    /// Canonical lower-case command name.
    pub command: &'a str,
    /// Arguments following the command name.
    pub args: &'a [String],
    /// Caller the command runs as.
    pub caller: &'a CallerPrincipal,
}

/// Business logic behind a registered command.
pub trait CommandHandler: Send + Sync {
    /// Executes the command.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] carrying the wire message when the command
    /// fails after the gate forwarded it.
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult;
}

impl<F> CommandHandler for F
where
    F: Fn(&Invocation<'_>) -> HandlerResult + Send + Sync,
{
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        self(invocation)
    }
}
