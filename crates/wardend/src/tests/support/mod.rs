//! Shared doubles for the daemon test suites.

mod client;
mod config_loader;
mod reporter;

pub use client::TestClient;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
