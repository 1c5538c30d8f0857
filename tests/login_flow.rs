//! End-to-end login conversations driven through the router, with outbound
//! traffic captured on the channel instead of a live transport.

mod common;

use common::{drain, make_router, next_text, text_event};
use gatebot::telegram::OutgoingAction;

#[test]
fn successful_login_round_trip() {
    let (router, mut rx) = make_router();
    let user = 1001;

    router.handle_event(&text_event(user, 1, "/login"));
    assert!(next_text(&mut rx).contains("enter your username"));

    router.handle_event(&text_event(user, 2, "admin"));
    let prompt = next_text(&mut rx);
    assert!(prompt.contains("Username: admin"));
    assert!(prompt.contains("password"));

    router.handle_event(&text_event(user, 3, "admin123"));
    let actions = drain(&mut rx);
    // The password message is scrubbed before the reply goes out.
    assert_eq!(
        actions[0],
        OutgoingAction::DeleteMessage {
            chat_id: user,
            message_id: 3
        }
    );
    match &actions[1] {
        OutgoingAction::SendText { text, .. } => {
            assert!(text.contains("Login successful"));
            assert!(text.contains("/info"));
            assert!(text.contains("/logout"));
        }
        other => panic!("expected success reply, got {:?}", other),
    }
    assert!(router.sessions().is_authenticated(user));

    // The attempt is finished: further step inputs are not login traffic.
    router.handle_event(&text_event(user, 4, "admin123"));
    assert!(drain(&mut rx).is_empty(), "stray step input must be dropped");
}

#[test]
fn invalid_credentials_are_rejected_generically() {
    let (router, mut rx) = make_router();
    let user = 1002;

    router.handle_event(&text_event(user, 1, "/login"));
    router.handle_event(&text_event(user, 2, "admin"));
    drain(&mut rx);

    router.handle_event(&text_event(user, 3, "wrong"));
    let actions = drain(&mut rx);
    assert_eq!(
        actions[0],
        OutgoingAction::DeleteMessage {
            chat_id: user,
            message_id: 3
        }
    );
    match &actions[1] {
        OutgoingAction::SendText { text, .. } => {
            assert!(text.contains("Invalid credentials"));
            // The reply must not hint at which half was wrong.
            let lower = text.to_lowercase();
            assert!(!lower.contains("username"));
            assert!(!lower.contains("password"));
        }
        other => panic!("expected rejection reply, got {:?}", other),
    }
    assert!(!router.sessions().is_authenticated(user));
}

#[test]
fn unknown_username_fails_like_bad_password() {
    let (router, mut rx) = make_router();
    let user = 1003;

    router.handle_event(&text_event(user, 1, "/login"));
    router.handle_event(&text_event(user, 2, "nouser"));
    drain(&mut rx);
    router.handle_event(&text_event(user, 3, "anything"));

    let actions = drain(&mut rx);
    match &actions[1] {
        OutgoingAction::SendText { text, .. } => assert!(text.contains("Invalid credentials")),
        other => panic!("expected rejection reply, got {:?}", other),
    }
    assert!(!router.sessions().is_authenticated(user));
}

#[test]
fn cancel_mid_flow_discards_attempt() {
    let (router, mut rx) = make_router();
    let user = 1004;

    router.handle_event(&text_event(user, 1, "/login"));
    router.handle_event(&text_event(user, 2, "x"));
    drain(&mut rx);

    router.handle_event(&text_event(user, 3, "/cancel"));
    assert!(next_text(&mut rx).contains("Login cancelled"));
    assert!(!router.sessions().is_authenticated(user));

    // A stray password after cancel reaches the unauthenticated fallback,
    // not the login machine.
    router.handle_event(&text_event(user, 4, "y"));
    assert!(next_text(&mut rx).contains("/login"));
    assert!(!router.sessions().is_authenticated(user));
}

#[test]
fn login_while_authenticated_is_refused() {
    let (router, mut rx) = make_router();
    let user = 1005;

    router.handle_event(&text_event(user, 1, "/login"));
    router.handle_event(&text_event(user, 2, "admin"));
    router.handle_event(&text_event(user, 3, "admin123"));
    drain(&mut rx);
    assert!(router.sessions().is_authenticated(user));

    router.handle_event(&text_event(user, 4, "/login"));
    assert!(next_text(&mut rx).contains("already logged in"));
}

#[test]
fn second_login_restarts_mid_flow_attempt() {
    let (router, mut rx) = make_router();
    let user = 1006;

    router.handle_event(&text_event(user, 1, "/login"));
    router.handle_event(&text_event(user, 2, "stale"));
    drain(&mut rx);

    // Restart: the machine is back at the username step.
    router.handle_event(&text_event(user, 3, "/login"));
    assert!(next_text(&mut rx).contains("enter your username"));

    router.handle_event(&text_event(user, 4, "admin"));
    assert!(next_text(&mut rx).contains("Username: admin"));
    router.handle_event(&text_event(user, 5, "admin123"));
    drain(&mut rx);
    assert!(router.sessions().is_authenticated(user));
}

#[test]
fn interleaved_logins_stay_independent() {
    let (router, mut rx) = make_router();
    let (alice, bob) = (2001, 2002);

    router.handle_event(&text_event(alice, 1, "/login"));
    router.handle_event(&text_event(bob, 1, "/login"));
    router.handle_event(&text_event(bob, 2, "demo"));
    router.handle_event(&text_event(alice, 2, "admin"));
    router.handle_event(&text_event(alice, 3, "admin123"));
    router.handle_event(&text_event(bob, 3, "not-the-password"));
    drain(&mut rx);

    assert!(router.sessions().is_authenticated(alice));
    assert!(!router.sessions().is_authenticated(bob));
}

#[test]
fn concurrent_logins_from_threads() {
    use std::sync::Arc;

    let (router, mut rx) = make_router();
    let router = Arc::new(router);

    let handles: Vec<_> = [(3001_i64, "admin", "admin123"), (3002, "demo", "demo123")]
        .into_iter()
        .map(|(user, name, pass)| {
            let router = Arc::clone(&router);
            let (name, pass) = (name.to_string(), pass.to_string());
            std::thread::spawn(move || {
                router.handle_event(&text_event(user, 1, "/login"));
                router.handle_event(&text_event(user, 2, &name));
                router.handle_event(&text_event(user, 3, &pass));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(router.sessions().is_authenticated(3001));
    assert!(router.sessions().is_authenticated(3002));
    assert_eq!(router.sessions().count(), 2);
    drain(&mut rx);
}
