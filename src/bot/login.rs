//! # Login State Machine
//!
//! The multi-step login conversation: `/login` prompts for a username, the
//! next plain-text message supplies it, the one after that supplies the
//! password. Verification happens once, against username and password
//! together, so a reply never reveals which of the two was wrong.
//!
//! Per-identity progress is a small sum type ([`LoginState`]) kept in a map
//! keyed by user id; an absent entry means no attempt is in flight. The
//! actual rules live in the pure [`transition`] function `(state, event) ->
//! (state, step)` so they are testable without a transport or registry.
//! [`LoginFlow`] wraps that function with the attempt table, the credential
//! check, session granting, and audit logging.
//!
//! Deliberate simplifications, preserved from the bot this reimplements: an
//! attempt never times out, and a fresh `/login` while one is mid-flight
//! silently restarts it.

use log::{info, warn};
use std::collections::HashMap;
use std::sync::Mutex;

use super::credentials::CredentialStore;
use super::session::{SessionRegistry, UserId};
use crate::logutil::escape_log;
use crate::metrics;

/// Pending step of one identity's login attempt. `Idle` is represented by
/// absence from the attempt table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    AwaitingUsername,
    AwaitingPassword { username: String },
}

/// Input to one transition of the machine.
#[derive(Debug, Clone, Copy)]
pub enum LoginEvent<'a> {
    Start,
    Text(&'a str),
    Cancel,
}

/// Observable result of a transition, mapped to user-facing replies by the
/// router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// `/login` while a session already exists; no attempt was created.
    AlreadyLoggedIn,
    PromptUsername,
    PromptPassword { username: String },
    /// Credentials verified; a session was granted.
    Granted { username: String },
    /// Verification failed; the attempt is discarded either way.
    Rejected,
    Cancelled,
    /// The event did not belong to this machine (no attempt in flight).
    NoAttempt,
}

/// Pure transition rules. Verification is the only side-effect-free lookup
/// performed here; granting, logging, and counters belong to the caller.
pub fn transition(
    state: Option<LoginState>,
    event: LoginEvent<'_>,
    credentials: &CredentialStore,
) -> (Option<LoginState>, LoginStep) {
    match (state, event) {
        // Starting always lands in AwaitingUsername, clobbering any
        // mid-flight attempt for the same identity.
        (_, LoginEvent::Start) => (Some(LoginState::AwaitingUsername), LoginStep::PromptUsername),

        (Some(LoginState::AwaitingUsername), LoginEvent::Text(text)) => {
            let username = text.trim().to_string();
            (
                Some(LoginState::AwaitingPassword {
                    username: username.clone(),
                }),
                LoginStep::PromptPassword { username },
            )
        }

        (Some(LoginState::AwaitingPassword { username }), LoginEvent::Text(text)) => {
            if credentials.verify(&username, text.trim()) {
                (None, LoginStep::Granted { username })
            } else {
                (None, LoginStep::Rejected)
            }
        }

        (None, LoginEvent::Text(_)) => (None, LoginStep::NoAttempt),

        (Some(_), LoginEvent::Cancel) => (None, LoginStep::Cancelled),
        (None, LoginEvent::Cancel) => (None, LoginStep::NoAttempt),
    }
}

/// The per-identity attempt table plus everything a completed transition
/// touches: the credential store, session grants, counters, audit log.
#[derive(Debug)]
pub struct LoginFlow {
    credentials: CredentialStore,
    attempts: Mutex<HashMap<UserId, LoginState>>,
}

impl LoginFlow {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Begin (or restart) a login attempt. Refused with
    /// [`LoginStep::AlreadyLoggedIn`] when a session already exists.
    pub fn start(&self, user: UserId, sessions: &SessionRegistry) -> LoginStep {
        if sessions.is_authenticated(user) {
            return LoginStep::AlreadyLoggedIn;
        }
        self.apply(user, LoginEvent::Start, sessions)
    }

    /// Feed one plain-text message into the attempt, if any. Returns
    /// [`LoginStep::NoAttempt`] when nothing is in flight so the router can
    /// fall through to its default handling.
    pub fn submit_text(&self, user: UserId, text: &str, sessions: &SessionRegistry) -> LoginStep {
        self.apply(user, LoginEvent::Text(text), sessions)
    }

    /// Abort an in-flight attempt.
    pub fn cancel(&self, user: UserId, sessions: &SessionRegistry) -> LoginStep {
        self.apply(user, LoginEvent::Cancel, sessions)
    }

    fn apply(&self, user: UserId, event: LoginEvent<'_>, sessions: &SessionRegistry) -> LoginStep {
        let step = {
            let mut attempts = self.attempts.lock().expect("login attempt table poisoned");
            let current = attempts.remove(&user);
            let (next, step) = transition(current, event, &self.credentials);
            if let Some(state) = next {
                attempts.insert(user, state);
            }
            step
        };

        match &step {
            LoginStep::Granted { username } => {
                sessions.grant(user);
                metrics::inc_login_succeeded();
                info!(
                    target: "security",
                    "User {} ({}) logged in successfully",
                    user,
                    escape_log(username)
                );
            }
            LoginStep::Rejected => {
                metrics::inc_login_failed();
                warn!(target: "security", "Failed login attempt for user {}", user);
            }
            _ => {}
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> CredentialStore {
        let mut table = HashMap::new();
        table.insert("admin".to_string(), "admin123".to_string());
        CredentialStore::new(table)
    }

    #[test]
    fn transition_walks_the_happy_path() {
        let credentials = creds();
        let (s1, step1) = transition(None, LoginEvent::Start, &credentials);
        assert_eq!(step1, LoginStep::PromptUsername);

        let (s2, step2) = transition(s1, LoginEvent::Text("  admin  "), &credentials);
        assert_eq!(
            step2,
            LoginStep::PromptPassword {
                username: "admin".into()
            }
        );

        let (s3, step3) = transition(s2, LoginEvent::Text("admin123"), &credentials);
        assert_eq!(
            step3,
            LoginStep::Granted {
                username: "admin".into()
            }
        );
        assert!(s3.is_none(), "terminal outcome must clear the attempt");
    }

    #[test]
    fn transition_rejects_without_blaming_a_field() {
        let credentials = creds();
        let state = Some(LoginState::AwaitingPassword {
            username: "admin".into(),
        });
        let (next, step) = transition(state, LoginEvent::Text("wrong"), &credentials);
        assert_eq!(step, LoginStep::Rejected);
        assert!(next.is_none());

        // Unknown username takes the same path as a bad password.
        let state = Some(LoginState::AwaitingPassword {
            username: "nobody".into(),
        });
        let (_, step) = transition(state, LoginEvent::Text("admin123"), &credentials);
        assert_eq!(step, LoginStep::Rejected);
    }

    #[test]
    fn stray_text_outside_an_attempt_is_not_handled() {
        let credentials = creds();
        let (next, step) = transition(None, LoginEvent::Text("hello"), &credentials);
        assert_eq!(step, LoginStep::NoAttempt);
        assert!(next.is_none());
    }

    #[test]
    fn flow_grants_session_on_success() {
        let flow = LoginFlow::new(creds());
        let sessions = SessionRegistry::new();

        assert_eq!(flow.start(9, &sessions), LoginStep::PromptUsername);
        flow.submit_text(9, "admin", &sessions);
        let step = flow.submit_text(9, "admin123", &sessions);
        assert_eq!(
            step,
            LoginStep::Granted {
                username: "admin".into()
            }
        );
        assert!(sessions.is_authenticated(9));

        // The attempt is gone; more text falls through.
        assert_eq!(flow.submit_text(9, "again", &sessions), LoginStep::NoAttempt);
    }

    #[test]
    fn flow_refuses_start_when_authenticated() {
        let flow = LoginFlow::new(creds());
        let sessions = SessionRegistry::new();
        sessions.grant(5);
        assert_eq!(flow.start(5, &sessions), LoginStep::AlreadyLoggedIn);
        // No attempt was created.
        assert_eq!(flow.submit_text(5, "admin", &sessions), LoginStep::NoAttempt);
    }

    #[test]
    fn cancel_discards_attempt() {
        let flow = LoginFlow::new(creds());
        let sessions = SessionRegistry::new();

        flow.start(3, &sessions);
        flow.submit_text(3, "admin", &sessions);
        assert_eq!(flow.cancel(3, &sessions), LoginStep::Cancelled);
        assert!(!sessions.is_authenticated(3));

        // A stray password after cancel is ignored.
        assert_eq!(
            flow.submit_text(3, "admin123", &sessions),
            LoginStep::NoAttempt
        );
        // Cancel with nothing in flight reports NoAttempt.
        assert_eq!(flow.cancel(3, &sessions), LoginStep::NoAttempt);
    }

    #[test]
    fn restart_clobbers_mid_flight_attempt() {
        let flow = LoginFlow::new(creds());
        let sessions = SessionRegistry::new();

        flow.start(4, &sessions);
        flow.submit_text(4, "stale-name", &sessions);
        // Restart: the next text is a username again, not a password.
        assert_eq!(flow.start(4, &sessions), LoginStep::PromptUsername);
        assert_eq!(
            flow.submit_text(4, "admin", &sessions),
            LoginStep::PromptPassword {
                username: "admin".into()
            }
        );
    }
}
