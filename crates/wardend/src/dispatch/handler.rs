//! Connection handler running the request loop.

use std::io::{BufRead, BufReader, Read, Write};

use tracing::{debug, warn};
use warden_gate::{DispatchGate, ExternalError};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::CommandRequest;
use super::response::{DaemonMessage, ResponseWriter};
use super::session::{AUTH_COMMAND, Session};

/// Maximum size of a single request line in bytes, excluding the newline.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Serves JSONL command requests through the dispatch gate.
///
/// A connection carries any number of requests. Each line gets exactly one
/// response line, in order, until the client closes its side.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    gate: DispatchGate,
}

impl DispatchConnectionHandler {
    /// Creates a handler forwarding every request through `gate`.
    pub fn new(gate: DispatchGate) -> Self {
        Self { gate }
    }

    /// Runs the request loop until end of input or a fatal error.
    ///
    /// The session runs as the default user unless its first request is
    /// `AUTH <user>`. The identity then stays fixed for the connection.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the session early.
    pub fn serve_session<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<usize, DispatchError> {
        let mut reader = BufReader::new(input);
        let mut writer = ResponseWriter::new(output);
        let mut session = Session::new();
        let mut served = 0_usize;
        loop {
            let line = match read_request_line(&mut reader) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(served),
                Err(error) => {
                    writer.write_message(&DaemonMessage::protocol_error(&error))?;
                    return Err(error);
                }
            };
            if line.trim_ascii().is_empty() {
                continue;
            }
            writer.write_message(&self.respond(&mut session, &line))?;
            served += 1;
        }
    }

    /// Builds the response for one request line.
    fn respond(&self, session: &mut Session, line: &[u8]) -> DaemonMessage {
        let request = match CommandRequest::parse(line) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request line");
                return DaemonMessage::protocol_error(&error);
            }
        };

        if request
            .name()
            .is_some_and(|name| name.eq_ignore_ascii_case(AUTH_COMMAND))
        {
            return match session.authenticate(&self.gate, request.args()) {
                Ok(value) => DaemonMessage::reply(value),
                Err(error) => DaemonMessage::error(&ExternalError::new(error.message())),
            };
        }
        session.bind();

        debug!(
            target: DISPATCH_TARGET,
            user = session.user(),
            tokens = request.command.len(),
            "dispatching request"
        );
        match self.gate.dispatch(session.user(), &request.command) {
            Ok(value) => DaemonMessage::reply(value),
            Err(error) => {
                debug!(target: DISPATCH_TARGET, code = error.code(), "request failed");
                DaemonMessage::error(&error)
            }
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let peer = stream.peer();
        let input = match stream.try_clone() {
            Ok(input) => input,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "failed to split connection");
                return;
            }
        };
        match self.serve_session(input, stream) {
            Ok(served) => debug!(target: DISPATCH_TARGET, %peer, served, "session closed"),
            Err(error) => warn!(target: DISPATCH_TARGET, %peer, %error, "session aborted"),
        }
    }
}

/// Reads one request line of at most [`MAX_REQUEST_BYTES`].
///
/// Returns `Ok(None)` at end of input. A final line without a newline is
/// still returned.
fn read_request_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let limit = u64::try_from(MAX_REQUEST_BYTES + 1).unwrap_or(u64::MAX);
    let read = reader.take(limit).read_until(b'\n', &mut buffer)?;
    if read == 0 {
        return Ok(None);
    }
    if buffer.last() != Some(&b'\n') && buffer.len() > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(
            buffer.len(),
            MAX_REQUEST_BYTES,
        ));
    }
    Ok(Some(buffer))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use rstest::{fixture, rstest};
    use warden_gate::DisclosurePolicy;

    use crate::commands::{Services, build_registry};

    use super::*;

    #[fixture]
    fn services() -> Services {
        Services::new(false)
    }

    fn handler(services: &Services, policy: DisclosurePolicy) -> DispatchConnectionHandler {
        let registry = Arc::new(build_registry(services).expect("registry"));
        let gate = DispatchGate::new(registry, services.acl.clone(), policy);
        DispatchConnectionHandler::new(gate)
    }

    fn session(handler: &DispatchConnectionHandler, input: &str) -> Vec<String> {
        let mut output = Vec::new();
        handler
            .serve_session(Cursor::new(input.as_bytes().to_vec()), &mut output)
            .expect("session");
        String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[rstest]
    fn one_response_per_request(services: Services) {
        let handler = handler(&services, DisclosurePolicy::Conceal);
        let lines = session(
            &handler,
            concat!(
                r#"{"command":["PING"]}"#,
                "\n",
                r#"{"command":["FT.CREATE","idx"]}"#,
                "\n\n",
                r#"{"command":["FT._LIST"]}"#,
            ),
        );
        assert_eq!(
            lines,
            vec![
                r#"{"kind":"reply","value":"PONG"}"#,
                r#"{"kind":"reply","value":"OK"}"#,
                r#"{"kind":"reply","value":["idx"]}"#,
            ]
        );
    }

    #[rstest]
    fn malformed_lines_do_not_end_the_session(services: Services) {
        let handler = handler(&services, DisclosurePolicy::Conceal);
        let lines = session(&handler, "not json\n{\"command\":[\"PING\"]}\n");
        assert_eq!(lines.len(), 2);
        assert!(lines.first().is_some_and(|line| line.contains("Protocol error")));
        assert!(lines.last().is_some_and(|line| line.contains("PONG")));
    }

    #[rstest]
    #[case::conceal(DisclosurePolicy::Conceal, "unknown command")]
    #[case::expose(DisclosurePolicy::Expose, "no permissions")]
    fn revoked_admin_cannot_reach_internal_update(
        services: Services,
        #[case] policy: DisclosurePolicy,
        #[case] expected: &str,
    ) {
        let handler = handler(&services, policy);
        let lines = session(
            &handler,
            concat!(
                r#"{"command":["ACL","SETUSER","default","-@admin"]}"#,
                "\n",
                r#"{"command":["FT.INTERNAL_UPDATE","CREATE","data","header"]}"#,
                "\n",
            ),
        );
        assert_eq!(lines.first().map(String::as_str), Some(r#"{"kind":"reply","value":"OK"}"#));
        let rejection = lines.get(1).expect("second response");
        assert!(rejection.contains(r#""kind":"error""#));
        assert!(rejection.contains(expected), "{rejection}");
    }

    #[rstest]
    fn revoked_connection_cannot_switch_to_another_user(services: Services) {
        let handler = handler(&services, DisclosurePolicy::Conceal);
        let update = r#"{"command":["FT.INTERNAL_UPDATE","idx","{\"version\":1,\"encoding_version\":1,\"fingerprint\":1}","{\"top_level_version\":1,\"top_level_fingerprint\":1}"]}"#;
        let input = [
            r#"{"command":["ACL","SETUSER","ops","on","+@admin"]}"#,
            r#"{"command":["ACL","SETUSER","default","-@admin"]}"#,
            update,
            r#"{"command":["AUTH","ops"]}"#,
            r#"{"user":"ops","command":["FT.INTERNAL_UPDATE","idx","{}","{}"]}"#,
            update,
        ]
        .join("\n");
        let lines = session(&handler, &input);

        assert_eq!(lines.len(), 6);
        assert!(lines.iter().take(2).all(|line| line.contains(r#""value":"OK""#)));
        assert!(lines.iter().skip(2).all(|line| line.contains(r#""kind":"error""#)), "{lines:?}");
        assert!(lines.get(3).is_some_and(|line| line.contains("first request")));
        assert!(lines.get(4).is_some_and(|line| line.contains("Protocol error")));
        assert!(lines.get(5).is_some_and(|line| line.contains("unknown command")));
        assert_eq!(services.stats.snapshot().parse_failures, 0);
        assert!(services.catalog.get("idx").is_err());
    }

    #[rstest]
    fn auth_as_first_request_selects_the_user(services: Services) {
        services
            .acl
            .set_user("reader", &["on", "+@read"])
            .expect("seed reader");
        let handler = handler(&services, DisclosurePolicy::Expose);
        let lines = session(
            &handler,
            concat!(
                r#"{"command":["auth","reader"]}"#,
                "\n",
                r#"{"command":["ACL","USERS"]}"#,
                "\n",
                r#"{"command":["PING"]}"#,
                "\n",
            ),
        );
        assert_eq!(
            lines,
            vec![
                r#"{"kind":"reply","value":"OK"}"#,
                r#"{"kind":"error","message":"NOPERM User reader has no permissions to run the 'acl' command"}"#,
                r#"{"kind":"reply","value":"PONG"}"#,
            ]
        );
    }

    #[rstest]
    fn info_reports_internal_update_failures(services: Services) {
        let handler = handler(&services, DisclosurePolicy::Conceal);
        let lines = session(
            &handler,
            concat!(
                r#"{"command":["FT.INTERNAL_UPDATE","idx","{}","{}"]}"#,
                "\n",
                r#"{"command":["INFO"]}"#,
                "\n",
            ),
        );
        assert!(lines.first().is_some_and(|line| line.contains(r#""kind":"error""#)));
        assert_eq!(
            lines.get(1).map(String::as_str),
            Some(concat!(
                r#"{"kind":"reply","value":["internal_update_parse_failures",1,"#,
                r#""internal_update_process_failures",0,"#,
                r#""internal_update_skipped_entries",0]}"#,
            ))
        );
    }

    #[rstest]
    fn empty_command_arrays_are_reported(services: Services) {
        let handler = handler(&services, DisclosurePolicy::Conceal);
        let lines = session(&handler, "{\"command\":[]}\n");
        assert_eq!(lines, vec![r#"{"kind":"error","message":"ERR empty command"}"#]);
    }

    #[rstest]
    fn oversized_lines_end_the_session(services: Services) {
        let handler = handler(&services, DisclosurePolicy::Conceal);
        let input = "x".repeat(MAX_REQUEST_BYTES + 10);
        let mut output = Vec::new();
        let error = handler
            .serve_session(Cursor::new(input.into_bytes()), &mut output)
            .expect_err("too large");
        assert!(matches!(error, DispatchError::RequestTooLarge { .. }));
        assert!(String::from_utf8_lossy(&output).contains("request too large"));
    }

    #[test]
    fn final_line_without_newline_is_read() {
        let mut reader = Cursor::new(b"abc".to_vec());
        assert_eq!(
            read_request_line(&mut reader).expect("read"),
            Some(b"abc".to_vec())
        );
        assert_eq!(read_request_line(&mut reader).expect("eof"), None);
    }
}
