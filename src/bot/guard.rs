//! # Authorization Guard
//!
//! Protected operations are registered once, by name, into a
//! [`CommandRegistry`]; the registry's [`dispatch`](CommandRegistry::dispatch)
//! method is the only way to execute one, and it always consults the
//! [`SessionRegistry`] first. There is no per-call-site "remember to check
//! auth" discipline: an operation that is registered is gated, an operation
//! that is not registered does not exist.
//!
//! The guard decides only *whether* an operation runs, never *what* it does;
//! handlers return display text the guard passes through untouched.

use chrono::{DateTime, Utc};
use log::info;

use super::session::{SessionRegistry, UserId};
use crate::metrics;

/// Everything a protected operation may look at while rendering its reply.
pub struct OpContext<'a> {
    pub user_id: UserId,
    pub sessions: &'a SessionRegistry,
    /// Process start time, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

type OpHandler = Box<dyn Fn(&OpContext<'_>) -> String + Send + Sync>;

/// One gated operation: a command name, its menu description, and the
/// handler producing its reply text.
pub struct ProtectedOp {
    name: &'static str,
    description: &'static str,
    handler: OpHandler,
}

/// Result of dispatching a protected command.
#[derive(Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Caller has no session; the operation was not invoked.
    Denied,
    /// Operation ran; its reply text passes through unchanged.
    Output(String),
}

#[derive(Default)]
pub struct CommandRegistry {
    ops: Vec<ProtectedOp>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a protected operation. Registration is the single path by
    /// which an operation becomes invokable, so the auth check in
    /// [`dispatch`](Self::dispatch) covers every operation uniformly.
    pub fn register<F>(&mut self, name: &'static str, description: &'static str, handler: F)
    where
        F: Fn(&OpContext<'_>) -> String + Send + Sync + 'static,
    {
        debug_assert!(
            !self.contains(name),
            "duplicate protected command registration: {name}"
        );
        self.ops.push(ProtectedOp {
            name,
            description,
            handler: Box::new(handler),
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.iter().any(|op| op.name == name)
    }

    /// `(name, description)` pairs in registration order, for menu and help
    /// rendering.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.ops.iter().map(|op| (op.name, op.description))
    }

    /// Execute `name` for `user`, auth check included. Returns `None` when
    /// no such operation is registered.
    pub fn dispatch(&self, name: &str, ctx: &OpContext<'_>) -> Option<GuardOutcome> {
        let op = self.ops.iter().find(|op| op.name == name)?;
        if !ctx.sessions.is_authenticated(ctx.user_id) {
            metrics::inc_denied_request();
            info!(
                target: "security",
                "Denied /{} for unauthenticated user {}",
                op.name,
                ctx.user_id
            );
            return Some(GuardOutcome::Denied);
        }
        Some(GuardOutcome::Output((op.handler)(ctx)))
    }
}
