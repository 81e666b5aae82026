//! Holder for the ECPP session token.

use std::sync::RwLock;

/// The authentication token obtained by the most recent successful login.
///
/// One instance is owned by each [`EcppClient`](crate::ecpp::remote::EcppClient).
/// Absent at startup, overwritten by every login, never refreshed.
#[derive(Debug, Default)]
pub struct SessionContext {
    token: RwLock<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    /// Current token, or an empty string before the first login.
    pub fn token(&self) -> String {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token().is_empty()
    }

    pub fn clear(&self) {
        self.set_token(String::new());
    }
}

/// First five characters of a token, for log lines.
pub(crate) fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(5).collect();
    format!("{}...", prefix)
}
