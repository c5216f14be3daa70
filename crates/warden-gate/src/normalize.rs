//! Canonicalisation of raw command tokens.

use thiserror::Error;

/// Command tokens after case folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    /// Command name exactly as the client sent it, used in error text.
    pub original: String,
    /// Lower-cased command name used for lookup.
    pub canonical: String,
    /// Arguments following the command name, untouched.
    pub args: Vec<String>,
}

impl NormalizedCommand {
    /// Number of arguments after the command name.
    #[must_use]
    pub const fn arg_count(&self) -> usize {
        self.args.len()
    }
}

/// Errors raised for requests that carry no usable command name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The token list was empty.
    #[error("empty command")]
    Empty,
    /// The command token was blank.
    #[error("blank command name")]
    BlankName,
}

/// Splits `[cmd, arg1, .., argN]` into a canonical name and its arguments.
///
/// Only the command name is case-folded; arguments keep their bytes.
///
/// # Errors
///
/// Returns [`NormalizeError::Empty`] for an empty token list and
/// [`NormalizeError::BlankName`] when the first token is blank.
pub fn normalize<S: AsRef<str>>(tokens: &[S]) -> Result<NormalizedCommand, NormalizeError> {
    let (name, args) = tokens.split_first().ok_or(NormalizeError::Empty)?;
    let original = name.as_ref().trim();
    if original.is_empty() {
        return Err(NormalizeError::BlankName);
    }
    Ok(NormalizedCommand {
        original: original.to_owned(),
        canonical: original.to_ascii_lowercase(),
        args: args.iter().map(|arg| arg.as_ref().to_owned()).collect(),
    })
}
