//! The contract scenarios for the `/posts` endpoint family.
//!
//! Each [`Scenario`] issues its requests through the shared `ApiClient`
//! and checks status, content type and body. Scenarios assume the store
//! holds exactly the baseline when they start; the runner guarantees that
//! by resetting before and after each one.
//!
//! Expected error responses (404 on a missing post, 500 on a duplicate id)
//! are requested with `fail_on_status_code(false)` and asserted like any
//! other response.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Debug;

use crate::client::{ApiClient, ApiResponse, RequestOptions};
use crate::error::{ContractError, Result};
use crate::fixtures::DbSnapshot;
use crate::posts::{POSTS_PATH, Post, post_path, posts_by_id_path};

/// Content type every JSON response must carry, byte for byte.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Message the server embeds in its 500 response for a duplicate insert.
pub const DUPLICATE_ID_MESSAGE: &str = "Error: Insert failed, duplicate id";

/// Id that no baseline post uses.
const MISSING_ID: u64 = 100;
const MISSING_WRITE_ID: u64 = 101;

/// What a scenario needs: the authenticated client and the expected store.
pub struct ScenarioContext<'a> {
    pub client: &'a ApiClient,
    pub expected: &'a DbSnapshot,
}

impl ScenarioContext<'_> {
    /// The `index`-th post of the expected snapshot.
    fn expected_post(&self, index: usize) -> Result<&Post> {
        self.expected.posts.get(index).ok_or_else(|| {
            ContractError::assertion(format!(
                "db.json has {} posts, scenario needs index {index}",
                self.expected.posts.len()
            ))
        })
    }

    async fn send(&self, options: impl Into<RequestOptions>) -> Result<ApiResponse> {
        self.client.request(options).await
    }

    /// Sends a request whose error status is part of the expectation.
    async fn send_expecting_error(&self, options: RequestOptions) -> Result<ApiResponse> {
        self.client.request(options.fail_on_status_code(false)).await
    }

    /// A follow-up GET proving that `id` was not created as a side effect.
    async fn expect_still_missing(&self, id: u64) -> Result<()> {
        let resp = self
            .send_expecting_error(RequestOptions::new(Method::GET, post_path(id)))
            .await?;
        expect_status(&resp, StatusCode::NOT_FOUND)
            .map_err(|e| ContractError::assertion(format!("post {id} exists after the call: {e}")))
    }
}

/// One contract check, in declaration order of the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    ListPostsReturnsJson,
    ListAllPosts,
    ListPostsByProperties,
    GetPostReturnsJson,
    GetSinglePost,
    GetMissingPost,
    CreatePostReturnsJson,
    CreatePost,
    CreateDuplicatePost,
    ReplacePostReturnsJson,
    ReplacePost,
    ReplaceMissingPost,
    PatchPostReturnsJson,
    PatchPost,
    PatchMissingPost,
    DeletePostReturnsJson,
    DeletePost,
    DeleteMissingPost,
}

impl Scenario {
    pub const ALL: [Scenario; 18] = [
        Scenario::ListPostsReturnsJson,
        Scenario::ListAllPosts,
        Scenario::ListPostsByProperties,
        Scenario::GetPostReturnsJson,
        Scenario::GetSinglePost,
        Scenario::GetMissingPost,
        Scenario::CreatePostReturnsJson,
        Scenario::CreatePost,
        Scenario::CreateDuplicatePost,
        Scenario::ReplacePostReturnsJson,
        Scenario::ReplacePost,
        Scenario::ReplaceMissingPost,
        Scenario::PatchPostReturnsJson,
        Scenario::PatchPost,
        Scenario::PatchMissingPost,
        Scenario::DeletePostReturnsJson,
        Scenario::DeletePost,
        Scenario::DeleteMissingPost,
    ];

    /// The endpoint this scenario exercises, e.g. `"PUT /posts/:id"`.
    pub fn group(self) -> &'static str {
        use Scenario::*;
        match self {
            ListPostsReturnsJson | ListAllPosts | ListPostsByProperties => "GET /posts",
            GetPostReturnsJson | GetSinglePost | GetMissingPost => "GET /posts/:id",
            CreatePostReturnsJson | CreatePost | CreateDuplicatePost => "POST /posts",
            ReplacePostReturnsJson | ReplacePost | ReplaceMissingPost => "PUT /posts/:id",
            PatchPostReturnsJson | PatchPost | PatchMissingPost => "PATCH /posts/:id",
            DeletePostReturnsJson | DeletePost | DeleteMissingPost => "DELETE /posts/:id",
        }
    }

    pub fn title(self) -> &'static str {
        use Scenario::*;
        match self {
            ListPostsReturnsJson | GetPostReturnsJson | CreatePostReturnsJson
            | ReplacePostReturnsJson | PatchPostReturnsJson | DeletePostReturnsJson => {
                "Should return JSON"
            }
            ListAllPosts => "Should list all posts",
            ListPostsByProperties => "Should list posts using properties",
            GetSinglePost => "Should list a single post",
            GetMissingPost => "Should return an error for non-existent post",
            CreatePost => "Should create a new post",
            CreateDuplicatePost => "Should fail to create post if the id already exists",
            ReplacePost => "Should update a post",
            ReplaceMissingPost => "Should fail to update post that does not exist",
            PatchPost => "Should partially update a post",
            PatchMissingPost => "Should fail to partially update post that does not exist",
            DeletePost => "Should delete a post",
            DeleteMissingPost => "Should fail to delete post that does not exist",
        }
    }

    /// `"<group> <title>"`, the string `--grep` matches against.
    pub fn full_title(self) -> String {
        format!("{} {}", self.group(), self.title())
    }

    pub async fn run(self, ctx: &ScenarioContext<'_>) -> Result<()> {
        use Scenario::*;
        match self {
            ListPostsReturnsJson => {
                let resp = ctx.send(RequestOptions::new(Method::GET, POSTS_PATH)).await?;
                expect_status(&resp, StatusCode::OK)?;
                expect_json(&resp)
            }
            ListAllPosts => {
                let resp = ctx.send((Method::GET, POSTS_PATH)).await?;
                let listed = expect_array(&resp)?;
                expect_eq("post count", &listed.len(), &ctx.expected.posts.len())?;
                expect_body_eq(&resp, &ctx.expected.posts)
            }
            ListPostsByProperties => {
                let second = ctx.expected_post(1)?;
                let fourth = ctx.expected_post(3)?;
                let resp = ctx
                    .send((Method::GET, posts_by_id_path(&[second.id, fourth.id])))
                    .await?;
                let listed = expect_array(&resp)?;
                expect_eq("filtered post count", &listed.len(), &2)?;
                expect_contains(listed, second)?;
                expect_contains(listed, fourth)
            }
            GetPostReturnsJson => {
                let first = ctx.expected_post(0)?;
                let resp = ctx.send((Method::GET, post_path(first.id))).await?;
                expect_status(&resp, StatusCode::OK)?;
                expect_json(&resp)
            }
            GetSinglePost => {
                let first = ctx.expected_post(0)?;
                let resp = ctx.send((Method::GET, post_path(first.id))).await?;
                expect_body_eq(&resp, first)
            }
            GetMissingPost => {
                let resp = ctx
                    .send_expecting_error(RequestOptions::new(Method::GET, post_path(MISSING_ID)))
                    .await?;
                expect_status(&resp, StatusCode::NOT_FOUND)?;
                expect_empty_body(&resp)
            }
            CreatePostReturnsJson => {
                let post = Post::new(100, "Title of the 100th post", "100th Author");
                let resp = ctx
                    .send((Method::POST, POSTS_PATH, serde_json::to_value(&post)?))
                    .await?;
                expect_status(&resp, StatusCode::CREATED)?;
                expect_json(&resp)
            }
            CreatePost => {
                let post = Post::new(101, "Title of the 101st post", "101st Author");
                let resp = ctx
                    .send((Method::POST, POSTS_PATH, serde_json::to_value(&post)?))
                    .await?;
                expect_body_eq(&resp, &post)
            }
            CreateDuplicatePost => {
                let post = Post::new(102, "Title of the 102nd post", "102nd Author");
                ctx.send((Method::POST, POSTS_PATH, serde_json::to_value(&post)?))
                    .await?;

                let attempt = Post::new(102, "Title of a conflicting post", "Someone Else");
                let resp = ctx
                    .send_expecting_error(
                        RequestOptions::new(Method::POST, POSTS_PATH)
                            .body(serde_json::to_value(&attempt)?),
                    )
                    .await?;
                expect_status(&resp, StatusCode::INTERNAL_SERVER_ERROR)?;
                if !resp.text().contains(DUPLICATE_ID_MESSAGE) {
                    return Err(ContractError::assertion(format!(
                        "expected body to include {DUPLICATE_ID_MESSAGE:?}, got {:?}",
                        resp.text()
                    )));
                }

                let stored = ctx.send((Method::GET, post_path(post.id))).await?;
                expect_body_eq(&stored, &post).map_err(|e| {
                    ContractError::assertion(format!("duplicate insert mutated the store: {e}"))
                })
            }
            ReplacePostReturnsJson => {
                let first = ctx.expected_post(0)?;
                let updated = replacement_for(first.id);
                let resp = ctx
                    .send((Method::PUT, post_path(first.id), serde_json::to_value(&updated)?))
                    .await?;
                expect_status(&resp, StatusCode::OK)?;
                expect_json(&resp)
            }
            ReplacePost => {
                let first = ctx.expected_post(0)?;
                let updated = replacement_for(first.id);
                let resp = ctx
                    .send((Method::PUT, post_path(first.id), serde_json::to_value(&updated)?))
                    .await?;
                expect_body_eq(&resp, &updated)
            }
            ReplaceMissingPost => {
                let resp = ctx
                    .send_expecting_error(
                        RequestOptions::new(Method::PUT, post_path(MISSING_WRITE_ID)).body(json!({
                            "id": MISSING_WRITE_ID,
                            "title": "Title of the new updated 101st post",
                            "author": "New Updated 101st Author",
                        })),
                    )
                    .await?;
                expect_status(&resp, StatusCode::NOT_FOUND)?;
                expect_empty_body(&resp)?;
                ctx.expect_still_missing(MISSING_WRITE_ID).await
            }
            PatchPostReturnsJson => {
                let first = ctx.expected_post(0)?;
                let resp = ctx
                    .send((Method::PATCH, post_path(first.id), author_patch(first.id)))
                    .await?;
                expect_status(&resp, StatusCode::OK)?;
                expect_json(&resp)
            }
            PatchPost => {
                let first = ctx.expected_post(0)?;
                let resp = ctx
                    .send((Method::PATCH, post_path(first.id), author_patch(first.id)))
                    .await?;
                let merged = Post::new(first.id, first.title.clone(), "New Updated 1st Author");
                expect_body_eq(&resp, &merged)
            }
            PatchMissingPost => {
                let resp = ctx
                    .send_expecting_error(
                        RequestOptions::new(Method::PATCH, post_path(MISSING_WRITE_ID)).body(json!({
                            "id": MISSING_WRITE_ID,
                            "author": "New Updated 101st Author",
                        })),
                    )
                    .await?;
                expect_status(&resp, StatusCode::NOT_FOUND)?;
                expect_empty_body(&resp)?;
                ctx.expect_still_missing(MISSING_WRITE_ID).await
            }
            DeletePostReturnsJson => {
                let first = ctx.expected_post(0)?;
                let resp = ctx.send((Method::DELETE, post_path(first.id))).await?;
                expect_status(&resp, StatusCode::OK)?;
                expect_json(&resp)
            }
            DeletePost => {
                let first = ctx.expected_post(0)?;
                let resp = ctx.send((Method::DELETE, post_path(first.id))).await?;
                expect_empty_body(&resp)?;
                ctx.expect_still_missing(first.id).await
            }
            DeleteMissingPost => {
                let resp = ctx
                    .send_expecting_error(RequestOptions::new(
                        Method::DELETE,
                        post_path(MISSING_ID),
                    ))
                    .await?;
                expect_status(&resp, StatusCode::NOT_FOUND)?;
                expect_empty_body(&resp)?;
                ctx.expect_still_missing(MISSING_ID).await
            }
        }
    }
}

fn replacement_for(id: u64) -> Post {
    Post::new(id, "Title of the new updated 1st post", "New Updated 1st Author")
}

fn author_patch(id: u64) -> serde_json::Value {
    json!({ "id": id, "author": "New Updated 1st Author" })
}

// ── Assertions ─────────────────────────────────────────────────────────

fn expect_status(resp: &ApiResponse, expected: StatusCode) -> Result<()> {
    if resp.status() == expected {
        Ok(())
    } else {
        Err(ContractError::assertion(format!(
            "expected status {expected}, got {} with body {:?}",
            resp.status(),
            resp.text()
        )))
    }
}

fn expect_json(resp: &ApiResponse) -> Result<()> {
    match resp.content_type() {
        Some(JSON_CONTENT_TYPE) => Ok(()),
        other => Err(ContractError::assertion(format!(
            "expected content-type {JSON_CONTENT_TYPE:?}, got {other:?}"
        ))),
    }
}

fn expect_empty_body(resp: &ApiResponse) -> Result<()> {
    if resp.is_body_empty() {
        Ok(())
    } else {
        Err(ContractError::assertion(format!(
            "expected an empty body, got {}",
            resp.body()
        )))
    }
}

fn expect_body_eq<T: Serialize>(resp: &ApiResponse, expected: &T) -> Result<()> {
    let expected = serde_json::to_value(expected)?;
    if resp.body() == &expected {
        Ok(())
    } else {
        Err(ContractError::assertion(format!(
            "expected body {expected}, got {}",
            resp.body()
        )))
    }
}

fn expect_eq<T: PartialEq + Debug + ?Sized>(what: &str, actual: &T, expected: &T) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(ContractError::assertion(format!(
            "{what}: expected {expected:?}, got {actual:?}"
        )))
    }
}

fn expect_array(resp: &ApiResponse) -> Result<&[Value]> {
    resp.body().as_array().map(Vec::as_slice).ok_or_else(|| {
        ContractError::assertion(format!("expected a JSON array, got {}", resp.body()))
    })
}

/// Exact match of one listed record, extra fields included.
fn expect_contains(listed: &[Value], wanted: &Post) -> Result<()> {
    let wanted = serde_json::to_value(wanted)?;
    if listed.contains(&wanted) {
        Ok(())
    } else {
        Err(ContractError::assertion(format!(
            "expected {wanted} among {}",
            Value::Array(listed.to_vec())
        )))
    }
}
