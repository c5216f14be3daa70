//! The `ACL` administrative command.

use std::sync::Arc;

use warden_gate::{CommandHandler, HandlerError, HandlerResult, Invocation, Reply};

use super::{AclError, AclStore};

/// Handler for `ACL SETUSER | GETUSER | USERS`.
#[derive(Debug, Clone)]
pub(crate) struct AclCommand {
    store: Arc<AclStore>,
}

impl AclCommand {
    pub(crate) fn new(store: Arc<AclStore>) -> Self {
        Self { store }
    }

    fn set_user(&self, args: &[String]) -> HandlerResult {
        let Some((user, rules)) = args.split_first() else {
            return Err(wrong_arity("setuser"));
        };
        self.store.set_user(user, rules).map_err(|error| match error.rule() {
            Some(rule) => HandlerError::new(format!(
                "ERR Error in ACL SETUSER modifier '{rule}': {error}"
            )),
            None => store_unavailable(&error),
        })?;
        Ok(Reply::ok())
    }

    fn get_user(&self, args: &[String]) -> HandlerResult {
        let [user] = args else {
            return Err(wrong_arity("getuser"));
        };
        let principal = self
            .store
            .get_user(user)
            .map_err(|error| store_unavailable(&error))?;
        Ok(principal.map_or(Reply::Nil, |principal| {
            let flag = if principal.is_enabled() { "on" } else { "off" };
            Reply::Array(vec![
                Reply::Bulk("flags".to_owned()),
                Reply::strings([flag]),
                Reply::Bulk("categories".to_owned()),
                Reply::strings(principal.capabilities().map(|tag| format!("+@{tag}"))),
            ])
        }))
    }

    fn users(&self, args: &[String]) -> HandlerResult {
        if !args.is_empty() {
            return Err(wrong_arity("users"));
        }
        let users = self
            .store
            .users()
            .map_err(|error| store_unavailable(&error))?;
        Ok(Reply::strings(users))
    }
}

impl CommandHandler for AclCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        let Some((subcommand, rest)) = invocation.args.split_first() else {
            return Err(HandlerError::new(
                "ERR wrong number of arguments for 'acl' command",
            ));
        };
        match subcommand.to_ascii_lowercase().as_str() {
            "setuser" => self.set_user(rest),
            "getuser" => self.get_user(rest),
            "users" => self.users(rest),
            _ => Err(HandlerError::new(format!(
                "ERR unknown subcommand '{subcommand}'. Try ACL HELP."
            ))),
        }
    }
}

fn wrong_arity(subcommand: &str) -> HandlerError {
    HandlerError::new(format!(
        "ERR wrong number of arguments for 'acl|{subcommand}' command"
    ))
}

fn store_unavailable(error: &AclError) -> HandlerError {
    HandlerError::new(format!("ERR {error}"))
}
