//! Typed helpers for the `/posts` resource.
//!
//! | Function | API Path |
//! |----------|----------|
//! | [`list_post_ids`] | GET `/posts` |
//! | [`list_posts_by_id`] | GET `/posts?id=..&id=..` |
//! | [`get_post`] | GET `/posts/{id}` |
//! | [`create_post`] | POST `/posts` |
//! | [`replace_post`] | PUT `/posts/{id}` |
//! | [`patch_post`] | PATCH `/posts/{id}` |
//! | [`delete_post`] | DELETE `/posts/{id}` |
//!
//! All helpers fail on a non-success status. Scenarios that assert on
//! error responses use `ApiClient::request` directly instead.

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, RecordId};

/// Collection path, shared with the scenarios.
pub const POSTS_PATH: &str = "/posts";

/// A blog post as stored by the API. `id` is assigned by the caller and
/// must be unique within the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub author: String,
}

impl Post {
    pub fn new(id: u64, title: impl Into<String>, author: impl Into<String>) -> Self {
        Post {
            id,
            title: title.into(),
            author: author.into(),
        }
    }
}

/// Partial update body for PATCH. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Path of a single post.
pub fn post_path(id: u64) -> String {
    format!("{POSTS_PATH}/{id}")
}

/// Path filtering the collection by id, e.g. `/posts?id=2&id=4`.
pub fn posts_by_id_path(ids: &[u64]) -> String {
    if ids.is_empty() {
        return POSTS_PATH.to_string();
    }
    let query: Vec<String> = ids.iter().map(|id| format!("id={id}")).collect();
    format!("{POSTS_PATH}?{}", query.join("&"))
}

/// Lists the id of every stored post, whatever else the record holds.
pub async fn list_post_ids(client: &ApiClient) -> crate::error::Result<Vec<u64>> {
    let records: Vec<RecordId> = client.get(POSTS_PATH).await?;
    Ok(records.into_iter().map(|r| r.id).collect())
}

/// Lists the posts whose id is in `ids`. The server decides the order.
pub async fn list_posts_by_id(client: &ApiClient, ids: &[u64]) -> crate::error::Result<Vec<Post>> {
    client.get(&posts_by_id_path(ids)).await
}

/// Fetches one post. A missing id surfaces as `ContractError::Api` with
/// status 404.
pub async fn get_post(client: &ApiClient, id: u64) -> crate::error::Result<Post> {
    client.get(&post_path(id)).await
}

/// Inserts a post. A duplicate id is rejected by the server with a 500.
pub async fn create_post(client: &ApiClient, post: &Post) -> crate::error::Result<Post> {
    client.post(POSTS_PATH, post).await
}

/// Fully replaces an existing post. There is no upsert: a missing id
/// yields a 404.
pub async fn replace_post(client: &ApiClient, id: u64, post: &Post) -> crate::error::Result<Post> {
    client.put(&post_path(id), post).await
}

/// Merges the supplied fields into an existing post and returns the result.
pub async fn patch_post(
    client: &ApiClient,
    id: u64,
    patch: &PostPatch,
) -> crate::error::Result<Post> {
    client.patch(&post_path(id), patch).await
}

pub async fn delete_post(client: &ApiClient, id: u64) -> crate::error::Result<()> {
    client.delete(&post_path(id)).await
}
