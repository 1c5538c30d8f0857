//! # Command Router
//!
//! Maps every inbound [`TextEvent`] to exactly one handler. Precedence:
//!
//! 1. explicit command names (`/start`, `/login`, `/logout`, `/help`,
//!    `/cancel`, and each registered protected command);
//! 2. plain text while a login attempt is in flight - forwarded to the
//!    login machine as the pending username or password;
//! 3. plain text from users without a session - the "please /login" nudge;
//! 4. everything else (authenticated free text, unknown commands) is
//!    dropped silently.
//!
//! The router owns the shared state bundle and takes `&self` throughout, so
//! it is safe under concurrent invocation; the live server feeds it updates
//! in arrival order. All replies leave through the outgoing-action channel,
//! never by direct I/O, so tests drive it with a plain channel receiver.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use super::commands;
use super::credentials::CredentialStore;
use super::guard::{CommandRegistry, GuardOutcome, OpContext};
use super::login::{LoginFlow, LoginStep};
use super::session::SessionRegistry;
use crate::logutil::escape_log;
use crate::metrics;
use crate::telegram::{OutgoingAction, TextEvent};

pub struct Router {
    bot_name: String,
    sessions: SessionRegistry,
    login: LoginFlow,
    commands: CommandRegistry,
    outgoing: mpsc::UnboundedSender<OutgoingAction>,
    started_at: DateTime<Utc>,
}

impl Router {
    pub fn new(
        bot_name: String,
        credentials: CredentialStore,
        commands: CommandRegistry,
        outgoing: mpsc::UnboundedSender<OutgoingAction>,
    ) -> Self {
        Self {
            bot_name,
            sessions: SessionRegistry::new(),
            login: LoginFlow::new(credentials),
            commands,
            outgoing,
            started_at: Utc::now(),
        }
    }

    /// The session registry this router consults and updates.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Protected commands as registered, for menu construction.
    pub fn command_registry(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Route one inbound event. Never fails: every error class is resolved
    /// into a reply or a logged drop, so one bad event cannot take down the
    /// dispatch loop or disturb other identities.
    pub fn handle_event(&self, ev: &TextEvent) {
        let text = ev.content.trim();
        if text.is_empty() {
            return;
        }
        match commands::parse_command(text) {
            Some(name) => self.handle_command(ev, &name),
            None => self.handle_plain_text(ev, text),
        }
    }

    fn handle_command(&self, ev: &TextEvent, name: &str) {
        match name {
            "start" => {
                if self.sessions.is_authenticated(ev.user_id) {
                    self.send(ev.chat_id, commands::start_authenticated(&self.commands));
                } else {
                    self.send(ev.chat_id, commands::start_unauthenticated(&self.bot_name));
                }
            }
            "login" => match self.login.start(ev.user_id, &self.sessions) {
                LoginStep::AlreadyLoggedIn => {
                    self.send(ev.chat_id, commands::login_already_authenticated());
                }
                _ => self.send(ev.chat_id, commands::login_username_prompt()),
            },
            "cancel" => match self.login.cancel(ev.user_id, &self.sessions) {
                LoginStep::Cancelled => self.send(ev.chat_id, commands::login_cancelled()),
                // No attempt in flight: tolerated, nothing to say.
                _ => debug!("Ignoring /cancel without login attempt from user {}", ev.user_id),
            },
            "logout" => {
                if self.sessions.revoke(ev.user_id) {
                    metrics::inc_logout();
                    info!(target: "security", "User {} logged out", ev.user_id);
                    self.send(ev.chat_id, commands::logout_success());
                } else {
                    self.send(ev.chat_id, commands::logout_not_logged_in());
                }
            }
            "help" => {
                if self.sessions.is_authenticated(ev.user_id) {
                    self.send(ev.chat_id, commands::help_authenticated(&self.commands));
                } else {
                    self.send(ev.chat_id, commands::help_unauthenticated());
                }
            }
            other => {
                let ctx = OpContext {
                    user_id: ev.user_id,
                    sessions: &self.sessions,
                    started_at: self.started_at,
                };
                match self.commands.dispatch(other, &ctx) {
                    Some(GuardOutcome::Denied) => {
                        self.send(ev.chat_id, commands::authentication_required());
                    }
                    Some(GuardOutcome::Output(reply)) => self.send(ev.chat_id, reply),
                    None => debug!(
                        "Ignoring unknown command /{} from user {}",
                        escape_log(other),
                        ev.user_id
                    ),
                }
            }
        }
    }

    fn handle_plain_text(&self, ev: &TextEvent, text: &str) {
        match self.login.submit_text(ev.user_id, text, &self.sessions) {
            LoginStep::PromptPassword { username } => {
                self.send(ev.chat_id, commands::login_password_prompt(&username));
            }
            step @ (LoginStep::Granted { .. } | LoginStep::Rejected) => {
                // The message we just consumed was a password: scrub it from
                // the chat before replying. Best-effort only.
                self.delete(ev.chat_id, ev.message_id);
                if matches!(step, LoginStep::Granted { .. }) {
                    self.send(ev.chat_id, commands::login_success(&self.commands));
                } else {
                    self.send(ev.chat_id, commands::login_failed());
                }
            }
            LoginStep::NoAttempt => {
                if self.sessions.is_authenticated(ev.user_id) {
                    debug!(
                        "Dropping unrecognized text from authenticated user {}",
                        ev.user_id
                    );
                } else {
                    self.send(ev.chat_id, commands::please_login());
                }
            }
            // Not produced by text submission.
            LoginStep::AlreadyLoggedIn | LoginStep::PromptUsername | LoginStep::Cancelled => {}
        }
    }

    fn send(&self, chat_id: i64, text: String) {
        if self
            .outgoing
            .send(OutgoingAction::SendText { chat_id, text })
            .is_err()
        {
            warn!("Outgoing channel closed; dropping reply to chat {}", chat_id);
        }
    }

    fn delete(&self, chat_id: i64, message_id: i64) {
        let _ = self
            .outgoing
            .send(OutgoingAction::DeleteMessage {
                chat_id,
                message_id,
            });
    }
}
