//! Typed helpers for the auth side of the API: `/register` and `/users`.
//!
//! | Function | API Path |
//! |----------|----------|
//! | [`register`] | POST `/register` |
//! | [`list_user_ids`] | GET `/users` |
//! | [`delete_user`] | DELETE `/users/{id}` |

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, RecordId};
use crate::session::Credentials;

pub const REGISTER_PATH: &str = "/register";
pub const USERS_PATH: &str = "/users";

/// A registered user. The server also stores a password hash, which is
/// ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
}

/// Body returned by `POST /register`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Registers a new user and returns the issued access token.
///
/// Callers that want a typed `Auth` error on failure should go through
/// `lifecycle::register_test_user`.
pub async fn register(
    client: &ApiClient,
    credentials: &Credentials,
) -> crate::error::Result<RegisterResponse> {
    client.post(REGISTER_PATH, credentials).await
}

/// Lists the id of every registered user.
pub async fn list_user_ids(client: &ApiClient) -> crate::error::Result<Vec<u64>> {
    let records: Vec<RecordId> = client.get(USERS_PATH).await?;
    Ok(records.into_iter().map(|r| r.id).collect())
}

pub async fn delete_user(client: &ApiClient, id: u64) -> crate::error::Result<()> {
    client.delete(&format!("{USERS_PATH}/{id}")).await
}
