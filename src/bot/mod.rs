//! # Bot Core Module
//!
//! Everything between the Telegram transport and the protected operations:
//!
//! - [`server`] - lifecycle: startup checks, polling loop, shutdown
//! - [`router`] - one-handler-per-event dispatch and fallback policy
//! - [`login`] - the multi-step login state machine
//! - [`session`] - the authenticated-identity registry
//! - [`guard`] - protected-operation registry with structural auth checks
//! - [`credentials`] - the static username/password table
//! - [`commands`] - command parsing, reply texts, built-in operations
//!
//! ## Event flow
//!
//! ```text
//! getUpdates ──> Router ──┬── login commands ──> LoginFlow ──> SessionRegistry
//!                         ├── protected ops ───> CommandRegistry (guarded)
//!                         └── fallbacks/drops
//!                 all replies ──> OutgoingAction channel ──> writer task
//! ```

pub mod commands;
pub mod credentials;
pub mod guard;
pub mod login;
pub mod router;
pub mod server;
pub mod session;

pub use credentials::CredentialStore;
pub use guard::{CommandRegistry, GuardOutcome, OpContext};
pub use login::{LoginFlow, LoginStep};
pub use router::Router;
pub use server::BotServer;
pub use session::{SessionRegistry, UserId};
