//! Session context for authenticated requests.
//!
//! A `Session` holds the bearer token obtained by registering the test
//! user. It is handed to `ApiClient::with_session` once and read by every
//! request afterwards; nothing mutates it after construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Login credentials of the throwaway test user (the `user` fixture).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Bearer-token context injected into an `ApiClient`.
///
/// Invariants:
/// - The token is set once at construction and never changes.
/// - `Debug` output never contains the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Session {
            access_token: access_token.into(),
        }
    }

    /// Returns the raw access token.
    pub fn token(&self) -> &str {
        &self.access_token
    }

    /// Value for the `authorization` header: `Bearer <token>`.
    pub fn bearer_value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_value_prefixes_token() {
        let session = Session::new("eyJhbGciOi.test.token");
        assert_eq!(session.bearer_value(), "Bearer eyJhbGciOi.test.token");
        assert_eq!(session.token(), "eyJhbGciOi.test.token");
    }

    #[test]
    fn debug_redacts_token() {
        let session = Session::new("super-secret");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn credentials_deserialize_from_user_fixture() {
        let json = r#"{ "email": "tester@example.com", "password": "s3cret!" }"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.email, "tester@example.com");
        assert_eq!(creds.password, "s3cret!");
    }
}
