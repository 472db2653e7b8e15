//! Test-fixture lifecycle: the session and data-reset hooks the suite
//! runs around every scenario.
//!
//! - [`register_test_user`] — once before the suite; yields the `Session`.
//! - [`purge_all_users`] — before registering (clean slate) and after the
//!   suite (cleanup).
//! - [`reset_posts`] — before and after every scenario; restores the
//!   baseline so each scenario starts from the same store.
//!
//! Every step is one awaited request at a time. Any failed request aborts
//! the hook with its error; there is no retry and no partial success.

use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{ContractError, Result};
use crate::posts::{self, Post};
use crate::session::{Credentials, Session};
use crate::users;

/// Registers the test user and returns the session holding its token.
///
/// # Errors
///
/// `ContractError::Auth` for any failure of the registration call, with
/// the server's status and body in the message when it answered.
pub async fn register_test_user(client: &ApiClient, credentials: &Credentials) -> Result<Session> {
    let resp = users::register(client, credentials)
        .await
        .map_err(|e| registration_error(&credentials.email, e))?;

    info!(email = %credentials.email, "registered test user");
    Ok(Session::new(resp.access_token))
}

fn registration_error(email: &str, err: ContractError) -> ContractError {
    match err {
        ContractError::Api { status, body } => ContractError::Auth {
            message: format!("POST /register for {email} returned {status}: {body}"),
            source: None,
        },
        other => ContractError::Auth {
            message: format!("POST /register for {email} failed"),
            source: Some(Box::new(other)),
        },
    }
}

/// Deletes every user currently in the store. Returns how many were
/// deleted; an empty store is a no-op.
pub async fn purge_all_users(client: &ApiClient) -> Result<usize> {
    let existing = users::list_user_ids(client).await?;
    for &id in &existing {
        debug!(id, "deleting user");
        users::delete_user(client, id).await?;
    }
    info!(count = existing.len(), "purged users");
    Ok(existing.len())
}

/// Deletes every post, then inserts `baseline` in order.
///
/// Stored posts are read only for their `id`, so a malformed leftover
/// record is deleted like any other. All deletions complete before the
/// first insertion starts, so no scenario ever observes a half-reset store.
pub async fn reset_posts(client: &ApiClient, baseline: &[Post]) -> Result<()> {
    let existing = posts::list_post_ids(client).await?;
    for &id in &existing {
        posts::delete_post(client, id).await?;
    }

    for post in baseline {
        posts::create_post(client, post).await?;
    }

    debug!(
        deleted = existing.len(),
        inserted = baseline.len(),
        "restored post baseline"
    );
    Ok(())
}
