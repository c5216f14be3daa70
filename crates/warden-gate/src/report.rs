//! Mapping of gate rejections to client-visible error text.
//!
//! All wording decisions live here. The [`DisclosurePolicy`] decides whether
//! a privilege failure on an internal command admits that the command
//! exists.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::registry::Visibility;

/// Longest command name or argument quoted back in an unknown-command error.
const QUOTE_LIMIT: usize = 128;

/// How privilege failures on internal commands are reported.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DisclosurePolicy {
    /// Report the failure exactly like an unregistered command name.
    #[default]
    Conceal,
    /// Report a `NOPERM` error naming the command.
    Expose,
}

/// Why the gate refused to forward a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// No command is registered under the name.
    UnknownCommand,
    /// The argument count is outside the registered bounds.
    WrongArity,
    /// The caller lacks the required privilege tier.
    InsufficientPrivilege,
}

/// A refused call with the context needed to word the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Classified reason.
    pub reason: RejectionReason,
    /// Command name as the client spelled it.
    pub command: String,
    /// Canonical lower-case command name.
    pub canonical: String,
    /// Arguments the client sent.
    pub args: Vec<String>,
    /// User the call ran as.
    pub user: String,
    /// Visibility of the matched command; `None` for unknown names.
    pub visibility: Option<Visibility>,
}

/// Error response sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExternalError {
    message: String,
}

impl ExternalError {
    /// Wraps a complete wire message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wire message, including its error-code prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Leading error code such as `ERR` or `NOPERM`.
    #[must_use]
    pub fn code(&self) -> &str {
        self.message
            .split_once(' ')
            .map_or(self.message.as_str(), |(code, _)| code)
    }
}

/// Turns rejections into wire errors under one disclosure policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorReporter {
    policy: DisclosurePolicy,
}

impl ErrorReporter {
    /// Creates a reporter applying `policy`.
    #[must_use]
    pub const fn new(policy: DisclosurePolicy) -> Self {
        Self { policy }
    }

    /// Active disclosure policy.
    #[must_use]
    pub const fn policy(&self) -> DisclosurePolicy {
        self.policy
    }

    /// The reason the client is told about.
    ///
    /// Differs from the true reason only when an internal command is
    /// concealed.
    #[must_use]
    pub const fn disclosed_reason(&self, rejection: &Rejection) -> RejectionReason {
        match (rejection.reason, rejection.visibility, self.policy) {
            (
                RejectionReason::InsufficientPrivilege,
                Some(Visibility::Internal),
                DisclosurePolicy::Conceal,
            ) => RejectionReason::UnknownCommand,
            (reason, _, _) => reason,
        }
    }

    /// Words `rejection` as a wire error.
    #[must_use]
    pub fn report(&self, rejection: &Rejection) -> ExternalError {
        match self.disclosed_reason(rejection) {
            RejectionReason::UnknownCommand => {
                unknown_command(&rejection.command, &rejection.args)
            }
            RejectionReason::WrongArity => ExternalError::new(format!(
                "ERR wrong number of arguments for '{}' command",
                rejection.canonical
            )),
            RejectionReason::InsufficientPrivilege => ExternalError::new(format!(
                "NOPERM User {} has no permissions to run the '{}' command",
                rejection.user, rejection.canonical
            )),
        }
    }

    /// Words a request that never produced a command name.
    #[must_use]
    pub fn report_malformed(&self, error: &NormalizeError) -> ExternalError {
        ExternalError::new(format!("ERR {error}"))
    }
}

fn unknown_command(command: &str, args: &[String]) -> ExternalError {
    let quoted = args
        .iter()
        .map(|arg| format!("'{}' ", truncate(arg)))
        .collect::<String>();
    ExternalError::new(format!(
        "ERR unknown command '{}', with args beginning with: {quoted}",
        truncate(command)
    ))
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(QUOTE_LIMIT) {
        Some((cut, _)) => text.get(..cut).unwrap_or(text),
        None => text,
    }
}
