//! Connection handlers used by transport tests.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::{ConnectionHandler, ConnectionStream};

/// Counts connections and closes them immediately.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: ConnectionStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Writes every received line back to the client.
pub(crate) struct EchoHandler;

impl ConnectionHandler for EchoHandler {
    fn handle(&self, stream: ConnectionStream) {
        let Ok(reader) = stream.try_clone() else {
            return;
        };
        let mut writer = stream;
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else {
                return;
            };
            if writeln!(writer, "{line}").is_err() {
                return;
            }
        }
    }
}

/// Polls `count` until it reaches `expected` or two seconds pass.
pub(crate) fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}
