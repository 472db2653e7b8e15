//! Contract-test driver for a json-server style `/posts` REST API.
//!
//! Registers a throwaway user for a bearer token, restores a canonical
//! five-post baseline around every scenario, and checks the API's status
//! codes, content types and bodies for all five CRUD verbs, error paths
//! included.
//!
//! # Modules
//!
//! - [`client`] — request wrapper injecting the default bearer header.
//! - [`config`] — TOML file config and resolved suite settings.
//! - [`error`] — typed error hierarchy (`ContractError`).
//! - [`fixtures`] — loading of `user`, `defaultData` and `db.json`.
//! - [`lifecycle`] — register/purge users and reset the post baseline.
//! - [`posts`] — `Post` model and typed `/posts` helpers.
//! - [`runner`] — sequential suite runner and report.
//! - [`scenarios`] — the contract checks themselves.
//! - [`session`] — credentials and the bearer-token session context.
//! - [`users`] — `/register` and `/users` helpers.
//!
//! # Quick Start
//!
//! ```ignore
//! use posts_contract::client::ApiClient;
//! use posts_contract::fixtures::FixtureSet;
//! use posts_contract::runner::{RunOptions, run_suite};
//!
//! let client = ApiClient::new("http://localhost:3000")?;
//! let fixtures = FixtureSet::load("fixtures".as_ref(), "db.json".as_ref())?;
//! let report = run_suite(&client, &fixtures, &RunOptions::default()).await;
//! assert!(report.is_success());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod lifecycle;
pub mod posts;
pub mod runner;
pub mod scenarios;
pub mod session;
pub mod users;
