//! Response framing for the dispatch loop.

use std::io::Write;

use serde::Serialize;
use warden_gate::{ExternalError, Reply};

use super::errors::DispatchError;

/// One response line sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaemonMessage {
    /// The command ran; `value` is its unmodified result.
    Reply {
        /// Handler result.
        value: Reply,
    },
    /// The command was refused or failed.
    Error {
        /// Wire error text, starting with its error code.
        message: String,
    },
}

impl DaemonMessage {
    /// Successful reply.
    pub fn reply(value: Reply) -> Self {
        Self::Reply { value }
    }

    /// Error from the gate or a handler.
    pub fn error(error: &ExternalError) -> Self {
        Self::Error {
            message: error.message().to_owned(),
        }
    }

    /// Error for a request that never reached the gate.
    pub fn protocol_error(error: &DispatchError) -> Self {
        Self::Error {
            message: format!("ERR Protocol error: {error}"),
        }
    }
}

/// Writes daemon messages as JSONL, one flushed line each.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps an output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialises `message`, appends the newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation, writing or flushing fails.
    pub fn write_message(&mut self, message: &DaemonMessage) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn render(message: &DaemonMessage) -> String {
        let mut output = Vec::new();
        ResponseWriter::new(&mut output)
            .write_message(message)
            .expect("write message");
        String::from_utf8(output).expect("utf8")
    }

    #[rstest]
    #[case::status(Reply::ok(), r#"{"kind":"reply","value":"OK"}"#)]
    #[case::integer(Reply::Integer(3), r#"{"kind":"reply","value":3}"#)]
    #[case::nil(Reply::Nil, r#"{"kind":"reply","value":null}"#)]
    #[case::array(Reply::strings(["a"]), r#"{"kind":"reply","value":["a"]}"#)]
    fn replies_carry_natural_json(#[case] value: Reply, #[case] expected: &str) {
        assert_eq!(render(&DaemonMessage::reply(value)), format!("{expected}\n"));
    }

    #[test]
    fn errors_carry_the_wire_message() {
        let error = ExternalError::new("ERR unknown command 'X', with args beginning with: ");
        let line = render(&DaemonMessage::error(&error));
        assert!(line.contains(r#""kind":"error""#));
        assert!(line.contains("ERR unknown command 'X'"));
    }

    #[test]
    fn protocol_errors_are_prefixed() {
        let line = render(&DaemonMessage::protocol_error(&DispatchError::malformed(
            "empty request line",
        )));
        assert!(line.contains("ERR Protocol error: malformed JSONL: empty request line"));
    }
}
