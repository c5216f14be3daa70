//! Line-oriented client for a running daemon.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use serde_json::{Value, json};
use warden_config::SocketEndpoint;

use crate::transport::ConnectionStream;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Keeps one connection open and exchanges request/response lines on it.
///
/// The connection runs as the default user unless built with
/// [`TestClient::connect_as`].
pub struct TestClient {
    writer: ConnectionStream,
    reader: BufReader<ConnectionStream>,
}

impl TestClient {
    /// Connects to `endpoint`.
    pub fn connect(endpoint: &SocketEndpoint) -> Self {
        let stream = match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).expect("connect tcp");
                stream
                    .set_read_timeout(Some(READ_TIMEOUT))
                    .expect("set read timeout");
                ConnectionStream::Tcp(stream)
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => {
                let stream = UnixStream::connect(path.as_std_path()).expect("connect unix");
                stream
                    .set_read_timeout(Some(READ_TIMEOUT))
                    .expect("set read timeout");
                ConnectionStream::Unix(stream)
            }
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => panic!("unix sockets are unsupported here"),
        };
        let reader = BufReader::new(stream.try_clone().expect("clone stream"));
        Self {
            writer: stream,
            reader,
        }
    }

    /// Connects to `endpoint` and binds the connection to `user`.
    pub fn connect_as(endpoint: &SocketEndpoint, user: &str) -> Self {
        let mut client = Self::connect(endpoint);
        let response = client.send(&["AUTH", user]);
        assert_eq!(
            response,
            json!({ "kind": "reply", "value": "OK" }),
            "AUTH {user} failed"
        );
        client
    }

    /// Sends `command` and returns the parsed response line.
    pub fn send(&mut self, command: &[&str]) -> Value {
        let request = json!({ "command": command });
        self.send_raw(&request.to_string())
    }

    /// Sends an arbitrary line and returns the parsed response line.
    pub fn send_raw(&mut self, line: &str) -> Value {
        self.writer.write_all(line.as_bytes()).expect("write request");
        self.writer.write_all(b"\n").expect("write newline");
        self.writer.flush().expect("flush");

        let mut response = String::new();
        let read = self.reader.read_line(&mut response).expect("read response");
        assert!(read > 0, "daemon closed the connection");
        serde_json::from_str(&response).expect("response is JSON")
    }
}
