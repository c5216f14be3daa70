//! Request parsing for the dispatch loop.

use serde::Deserialize;

use super::errors::DispatchError;

/// One command sent by a client.
///
/// ```json
/// {"command":["FT.CREATE","idx","SCHEMA","title","TEXT"]}
/// ```
///
/// The request carries no identity; the user is bound to the connection.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    /// Command name followed by its arguments.
    pub command: Vec<String>,
}

impl CommandRequest {
    /// Parses one request line. Surrounding whitespace, including the
    /// newline delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedJsonl` for blank lines and for
    /// anything that is not a `CommandRequest` object.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }
        serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
    }

    /// Command name as sent, if any.
    pub fn name(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Arguments after the command name.
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }
}
