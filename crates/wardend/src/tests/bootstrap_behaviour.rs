//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;
use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, RunningDaemon, bootstrap_with};

use super::support::{
    FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestClient, TestConfigLoader,
};

struct BootstrapWorld {
    loader: Option<Box<dyn ConfigLoader>>,
    reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    error: Option<BootstrapError>,
    running: Option<RunningDaemon>,
    socket_path: Option<Utf8PathBuf>,
}

impl BootstrapWorld {
    fn new() -> Self {
        Self {
            loader: None,
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            error: None,
            running: None,
            socket_path: None,
        }
    }

    fn events(&self) -> Vec<HealthEvent> {
        self.reporter.events()
    }
}

impl Drop for BootstrapWorld {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.stop();
        }
    }
}

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Some(Box::new(TestConfigLoader::unix()));
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Some(Box::new(FailingConfigLoader));
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<BootstrapWorld>) {
    let mut world = world.borrow_mut();
    let reporter = Arc::clone(&world.reporter);
    let result = bootstrap_with(world.loader.as_deref().expect("loader configured"), reporter);
    match result {
        Ok(daemon) => world.daemon = Some(daemon),
        Err(error) => world.error = Some(error),
    }
}

#[when("the daemon starts listening")]
fn when_daemon_listens(world: &RefCell<BootstrapWorld>) {
    let mut world = world.borrow_mut();
    let daemon = world.daemon.as_ref().expect("daemon bootstrapped");
    let running = daemon.listen().expect("listen");
    world.socket_path = running.endpoint().unix_path().map(ToOwned::to_owned);
    world.running = Some(running);
}

#[when("a client pings the daemon")]
fn when_client_pings(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    let running = world.running.as_ref().expect("daemon listening");
    let mut client = TestClient::connect(running.endpoint());
    assert_eq!(
        client.send(&["PING"]),
        json!({ "kind": "reply", "value": "PONG" })
    );
}

#[when("the daemon stops")]
fn when_daemon_stops(world: &RefCell<BootstrapWorld>) {
    let running = world.borrow_mut().running.take().expect("daemon listening");
    running.stop().expect("stop listener");
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    assert!(
        world.error.is_none(),
        "bootstrap error: {:?}",
        world.error
    );
    assert!(world.daemon.is_some(), "daemon should have been initialised");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.error, Some(BootstrapError::Configuration { .. })),
        "expected a configuration error, got {:?}",
        world.error
    );
}

#[then("the health reporter saw {count} registered commands")]
fn then_registered_commands(world: &RefCell<BootstrapWorld>, count: usize) {
    let events = world.borrow().events();
    assert_eq!(
        events,
        vec![
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapSucceeded { commands: count },
        ]
    );
}

#[then("the health reporter recorded the bootstrap failure")]
fn then_failure_recorded(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
    assert!(
        matches!(events.last(), Some(HealthEvent::BootstrapFailed(message)) if message.contains("configuration")),
        "unexpected events: {events:?}"
    );
}

#[then("the socket file has been removed")]
fn then_socket_removed(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    let path = world.socket_path.as_ref().expect("unix socket path");
    assert!(!path.exists(), "socket {path} should have been removed");
}

#[then("the health reporter saw the listener stop after {count} connection")]
fn then_listener_stopped(world: &RefCell<BootstrapWorld>, count: u64) {
    let events = world.borrow().events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, HealthEvent::ListenerReady(_))),
        "listener never reported ready: {events:?}"
    );
    assert_eq!(
        events.last(),
        Some(&HealthEvent::ListenerStopped { connections: count })
    );
}

#[scenario(path = "tests/features/daemon_bootstrap.feature")]
fn daemon_bootstrap(#[from(world)] world: RefCell<BootstrapWorld>) {
    drop(world);
}
