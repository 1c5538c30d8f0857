//! Process-local authentication counters.
//!
//! Plain atomics, no exporter. The `/stats` command surfaces a
//! [snapshot] of these numbers; nothing here persists across restarts.
use std::sync::atomic::{AtomicU64, Ordering};

static LOGINS_SUCCEEDED: AtomicU64 = AtomicU64::new(0);
static LOGINS_FAILED: AtomicU64 = AtomicU64::new(0);
static LOGOUTS: AtomicU64 = AtomicU64::new(0);
static DENIED_REQUESTS: AtomicU64 = AtomicU64::new(0);

pub fn inc_login_succeeded() {
    LOGINS_SUCCEEDED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_login_failed() {
    LOGINS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_logout() {
    LOGOUTS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_denied_request() {
    DENIED_REQUESTS.fetch_add(1, Ordering::Relaxed);
}

/// Point-in-time copy of the authentication counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuthCounters {
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub logouts: u64,
    pub denied_requests: u64,
}

pub fn snapshot() -> AuthCounters {
    AuthCounters {
        logins_succeeded: LOGINS_SUCCEEDED.load(Ordering::Relaxed),
        logins_failed: LOGINS_FAILED.load(Ordering::Relaxed),
        logouts: LOGOUTS.load(Ordering::Relaxed),
        denied_requests: DENIED_REQUESTS.load(Ordering::Relaxed),
    }
}
