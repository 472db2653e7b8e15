//! Typed error hierarchy for the posts-contract crate.
//!
//! Every variant maps to a real boundary of the driver:
//! - `Auth` covers the `/register` call that yields the bearer token.
//! - `Api` covers any other request that came back with a status the
//!   caller did not opt into inspecting (see `RequestOptions::fail_on_status_code`).
//! - `Assertion` is a contract violation detected by a scenario.
//! - `Fixture` and `Config` cover the local files the suite reads, and
//!   `Report` the one it writes.
//! - `Network` and `Parse` wrap transport and JSON failures.
//!
//! `Api` keeps the response body so that a failed setup call still shows
//! what the server said.

use std::path::PathBuf;

use reqwest::StatusCode;

/// Unified error type for all posts-contract operations.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// Registering the throwaway test user failed.
    ///
    /// The message includes the HTTP status and response body when the
    /// server answered, so a rejected email/password pair is visible.
    #[error("registration failed: {message}")]
    Auth {
        /// Human-readable description including status and body when available.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The API returned a status outside 2xx/3xx on a request that was
    /// expected to succeed.
    #[error("API error {status}: {body}")]
    Api {
        /// The HTTP status code returned by the API.
        status: StatusCode,
        /// The raw response body text, possibly empty.
        body: String,
    },

    /// A contract scenario observed a response that does not match
    /// the expected behavior.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// A fixture file could not be read, parsed or validated.
    #[error("failed to load fixture {}: {source}", path.display())]
    Fixture {
        /// Path of the offending fixture file.
        path: PathBuf,
        /// What went wrong while loading it.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The configuration file is unreadable or malformed.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the problem, including the file path.
        message: String,
        /// The underlying IO or TOML error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The JSON report could not be written.
    #[error("failed to write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A header value (usually the bearer token) contains bytes that
    /// cannot be sent in an HTTP header.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// JSON (de)serialization failed.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Transport-level failure: DNS, TCP connect, timeout and so on.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ContractError {
    /// Shorthand for building an [`ContractError::Assertion`].
    pub fn assertion(message: impl Into<String>) -> Self {
        ContractError::Assertion(message.into())
    }

    /// Returns the HTTP status carried by an `Api` error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ContractError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, ContractError>;
