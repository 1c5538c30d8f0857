//! The static credential table checked at login.
//!
//! Credentials are plain (username, password) strings loaded from the
//! `[credentials]` config section at startup and never mutated afterward.
//! Comparison is byte-exact with no normalization, and the table stays
//! unhashed in memory for the whole process lifetime.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    table: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// True iff `username` is known and its stored password equals
    /// `password` exactly. Unknown usernames are simply false, not an error.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.table.get(username) {
            Some(expected) => expected == password,
            None => false,
        }
    }

    /// Number of accounts in the table. Used for startup logging only.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        let mut table = HashMap::new();
        table.insert("admin".to_string(), "admin123".to_string());
        CredentialStore::new(table)
    }

    #[test]
    fn verify_is_exact() {
        let creds = store();
        assert!(creds.verify("admin", "admin123"));
        assert!(!creds.verify("admin", "admin123 "));
        assert!(!creds.verify("admin", "Admin123"));
        assert!(!creds.verify("Admin", "admin123"));
    }

    #[test]
    fn unknown_username_is_false_for_any_password() {
        let creds = store();
        assert!(!creds.verify("nouser", "anything"));
        assert!(!creds.verify("nouser", ""));
        assert!(!creds.verify("", ""));
    }
}
