//! Test suites for the Warden daemon.

#[cfg(unix)]
mod bootstrap_behaviour;
mod support;
