//! Per-connection identity.
//!
//! A connection runs as [`DEFAULT_USER`] unless its very first request is
//! `AUTH <user>`. Once any request has been handled the identity is fixed
//! for the rest of the connection, so a client cannot trade a revoked
//! user for another one mid-stream.

use tracing::{debug, warn};
use warden_gate::{DispatchGate, HandlerError, Reply};

use crate::acl::DEFAULT_USER;

use super::DISPATCH_TARGET;

/// Command name the session layer answers itself.
pub(crate) const AUTH_COMMAND: &str = "AUTH";

/// Identity bound to one connection.
#[derive(Debug)]
pub(crate) struct Session {
    user: String,
    bound: bool,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            user: DEFAULT_USER.to_owned(),
            bound: false,
        }
    }

    /// User every request on this connection runs as.
    pub(crate) fn user(&self) -> &str {
        &self.user
    }

    /// Fixes the identity; later `AUTH` requests are refused.
    pub(crate) fn bind(&mut self) {
        self.bound = true;
    }

    /// Handles `AUTH <user>`.
    ///
    /// The session is bound whatever the outcome. A failed attempt leaves
    /// the connection running as the default user.
    pub(crate) fn authenticate(
        &mut self,
        gate: &DispatchGate,
        args: &[String],
    ) -> Result<Reply, HandlerError> {
        let already_bound = self.bound;
        self.bind();
        if already_bound {
            warn!(target: DISPATCH_TARGET, user = %self.user, "late AUTH refused");
            return Err(HandlerError::new(
                "ERR AUTH is only accepted as the first request on a connection",
            ));
        }
        let [user] = args else {
            return Err(HandlerError::new(
                "ERR wrong number of arguments for 'auth' command",
            ));
        };
        let user = user.trim();
        if user.is_empty() || !gate.resolve(user).is_enabled() {
            debug!(target: DISPATCH_TARGET, user, "AUTH rejected");
            return Err(HandlerError::new(format!(
                "ERR AUTH failed: user '{user}' is unknown or disabled"
            )));
        }
        user.clone_into(&mut self.user);
        debug!(target: DISPATCH_TARGET, user, "connection authenticated");
        Ok(Reply::ok())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};
    use warden_gate::DisclosurePolicy;

    use crate::commands::{Services, build_registry};

    use super::*;

    #[fixture]
    fn gate() -> DispatchGate {
        let services = Services::new(false);
        services
            .acl
            .set_user("ops", &["on", "+@admin"])
            .expect("seed ops");
        services.acl.set_user("ghost", &["+@admin"]).expect("seed ghost");
        let registry = Arc::new(build_registry(&services).expect("registry"));
        DispatchGate::new(registry, services.acl.clone(), DisclosurePolicy::Conceal)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[rstest]
    fn sessions_start_as_the_default_user() {
        assert_eq!(Session::new().user(), DEFAULT_USER);
    }

    #[rstest]
    fn first_request_auth_switches_user(gate: DispatchGate) {
        let mut session = Session::new();
        assert_eq!(session.authenticate(&gate, &args(&["ops"])), Ok(Reply::ok()));
        assert_eq!(session.user(), "ops");
    }

    #[rstest]
    fn auth_after_other_requests_is_refused(gate: DispatchGate) {
        let mut session = Session::new();
        session.bind();
        let error = session
            .authenticate(&gate, &args(&["ops"]))
            .expect_err("late auth");
        assert!(error.message().contains("first request"));
        assert_eq!(session.user(), DEFAULT_USER);
    }

    #[rstest]
    fn identity_cannot_change_twice(gate: DispatchGate) {
        let mut session = Session::new();
        assert!(session.authenticate(&gate, &args(&["ops"])).is_ok());
        assert!(session.authenticate(&gate, &args(&["default"])).is_err());
        assert_eq!(session.user(), "ops");
    }

    #[rstest]
    #[case::unknown("mallory")]
    #[case::disabled("ghost")]
    #[case::blank(" ")]
    fn unusable_users_are_refused(gate: DispatchGate, #[case] user: &str) {
        let mut session = Session::new();
        let error = session
            .authenticate(&gate, &args(&[user]))
            .expect_err("refused");
        assert!(error.message().starts_with("ERR AUTH failed"));
        assert_eq!(session.user(), DEFAULT_USER);
    }

    #[rstest]
    fn auth_takes_exactly_one_user(gate: DispatchGate) {
        let mut session = Session::new();
        let error = session
            .authenticate(&gate, &args(&["ops", "extra"]))
            .expect_err("arity");
        assert_eq!(
            error.message(),
            "ERR wrong number of arguments for 'auth' command"
        );
    }
}
