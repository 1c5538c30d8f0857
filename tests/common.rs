//! Test utilities & fixtures.
//!
//! Builds a [`Router`] wired to a capture channel instead of the live
//! Telegram writer, plus helpers for fabricating inbound events and
//! draining captured replies.

use std::collections::HashMap;

use gatebot::bot::{commands, CredentialStore, Router};
use gatebot::telegram::{OutgoingAction, TextEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Router with the demo credential table and a capture receiver for
/// everything it would have sent.
pub fn make_router() -> (Router, UnboundedReceiver<OutgoingAction>) {
    let mut table = HashMap::new();
    table.insert("admin".to_string(), "admin123".to_string());
    table.insert("demo".to_string(), "demo123".to_string());

    let (tx, rx) = mpsc::unbounded_channel();
    let router = Router::new(
        "Gatebot".to_string(),
        CredentialStore::new(table),
        commands::default_registry(),
        tx,
    );
    (router, rx)
}

/// Inbound text event. Chat id mirrors the user id, like a private chat.
pub fn text_event(user_id: i64, message_id: i64, content: &str) -> TextEvent {
    TextEvent {
        user_id,
        chat_id: user_id,
        message_id,
        content: content.to_string(),
    }
}

/// Every action captured so far.
#[allow(dead_code)]
pub fn drain(rx: &mut UnboundedReceiver<OutgoingAction>) -> Vec<OutgoingAction> {
    let mut actions = Vec::new();
    while let Ok(action) = rx.try_recv() {
        actions.push(action);
    }
    actions
}

/// The next captured action, which must be a text send; returns its body.
#[allow(dead_code)]
pub fn next_text(rx: &mut UnboundedReceiver<OutgoingAction>) -> String {
    match rx.try_recv().expect("expected an outgoing action") {
        OutgoingAction::SendText { text, .. } => text,
        other => panic!("expected SendText, got {:?}", other),
    }
}
