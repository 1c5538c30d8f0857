//! # Gatebot - a session-gated command bot for Telegram
//!
//! Gatebot sits between the Telegram Bot API and a set of protected
//! information commands. Anyone can talk to it, but the interesting
//! commands only answer after a completed `/login` conversation: the bot
//! asks for a username, then a password, checks both against a
//! config-supplied table, and records the resulting session in memory.
//!
//! ## Features
//!
//! - **Two-step login conversation**: `/login` prompts for username and
//!   password in turn; `/cancel` aborts; submitted passwords are scrubbed
//!   from the chat best-effort.
//! - **Structural command gating**: protected operations are registered in
//!   one place and are only reachable through a dispatch path that checks
//!   the session registry first.
//! - **In-memory sessions**: a session is set membership, nothing more; a
//!   restart logs everyone out.
//! - **Async design**: Tokio polling loop feeding a non-blocking dispatch
//!   core, with a dedicated writer task for outbound API calls.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatebot::bot::BotServer;
//! use gatebot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut server = BotServer::new(config)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - dispatch core: server, router, login machine, sessions, guard
//! - [`telegram`] - Bot API client, wire types, outgoing writer task
//! - [`config`] - TOML configuration and token resolution
//! - [`metrics`] - process-local authentication counters
//! - [`logutil`] - log sanitization for user-supplied text

pub mod bot;
pub mod config;
pub mod logutil;
pub mod metrics;
pub mod telegram;
