//! In-process fake of the json-server backend.
//!
//! Serves `/register`, `/users` and `/posts` from an in-memory store with
//! the same status codes, content type and error bodies as the real
//! backend. `Drift` switches individual behaviors to a non-conforming
//! variant so tests can check that the suite notices.

use axum::extract::{Path, RawQuery, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Deviations from the real backend's contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Drift {
    /// PUT on a missing id creates the post instead of answering 404.
    pub upsert_on_put: bool,
    /// A duplicate insert answers 409 with a JSON error instead of 500.
    pub conflict_on_duplicate: bool,
    /// `/register` always answers 400.
    pub reject_registration: bool,
    /// DELETE on a missing id answers 404 but leaves a stub record behind.
    pub stub_on_missing_delete: bool,
    /// GET `/posts` adds a `userId` field to every listed post.
    pub leak_user_id: bool,
}

#[derive(Default)]
struct Store {
    posts: Vec<Value>,
    users: Vec<Value>,
    next_user_id: u64,
    tokens: Vec<String>,
    post_authorizations: Vec<Option<String>>,
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Store>>,
    drift: Drift,
}

/// Running fake server. Shuts down when dropped.
pub struct FakeApi {
    pub base_url: String,
    store: Arc<Mutex<Store>>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeApi {
    /// Spawns a conforming backend on a random port.
    pub async fn spawn() -> Self {
        Self::spawn_with(Drift::default()).await
    }

    /// Spawns a backend with the given deviations. The store starts
    /// dirty (a stray post and a stale user) so the hooks have work to do.
    pub async fn spawn_with(drift: Drift) -> Self {
        let store = Arc::new(Mutex::new(Store {
            posts: vec![json!({"id": 42, "title": "Leftover", "author": "Previous Run"})],
            users: vec![json!({"id": 1, "email": "stale@example.com", "password": "$2a$10$x"})],
            next_user_id: 2,
            ..Default::default()
        }));
        let state = AppState {
            store: store.clone(),
            drift,
        };

        let app = Router::new()
            .route("/register", post(register))
            .route("/users", get(list_users))
            .route("/users/{id}", delete(delete_user))
            .route("/posts", get(list_posts).post(create_post))
            .route(
                "/posts/{id}",
                get(get_post)
                    .put(replace_post)
                    .patch(patch_post)
                    .delete(delete_post),
            )
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Fake API server failed");
        });

        FakeApi {
            base_url: format!("http://{addr}"),
            store,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn posts(&self) -> Vec<Value> {
        self.store.lock().unwrap().posts.clone()
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }

    pub fn issued_tokens(&self) -> Vec<String> {
        self.store.lock().unwrap().tokens.clone()
    }

    /// `authorization` header of every `/posts` request, in arrival order.
    pub fn post_authorizations(&self) -> Vec<Option<String>> {
        self.store.lock().unwrap().post_authorizations.clone()
    }
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, [(CONTENT_TYPE, JSON_UTF8)], body.to_string()).into_response()
}

fn empty(status: StatusCode) -> Response {
    json_response(status, json!({}))
}

/// Records the header and checks it against the issued tokens.
fn authorize(store: &mut Store, headers: &HeaderMap) -> Result<(), Response> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    store.post_authorizations.push(value.clone());

    let token = value.as_deref().and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(t) if store.tokens.iter().any(|issued| issued == t) => Ok(()),
        _ => Err(json_response(StatusCode::UNAUTHORIZED, json!("jwt malformed"))),
    }
}

fn position(posts: &[Value], id: u64) -> Option<usize> {
    posts.iter().position(|p| p["id"].as_u64() == Some(id))
}

async fn register(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if state.drift.reject_registration {
        return json_response(StatusCode::BAD_REQUEST, json!("Email already exists"));
    }
    let mut store = state.store.lock().unwrap();
    let id = store.next_user_id;
    store.next_user_id += 1;
    let email = body["email"].clone();
    store
        .users
        .push(json!({"id": id, "email": email, "password": "$2a$10$hashed"}));
    let token = format!("token-for-user-{id}");
    store.tokens.push(token.clone());
    json_response(
        StatusCode::CREATED,
        json!({"accessToken": token, "user": {"email": email, "id": id}}),
    )
}

async fn list_users(State(state): State<AppState>) -> Response {
    let store = state.store.lock().unwrap();
    json_response(StatusCode::OK, Value::Array(store.users.clone()))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let mut store = state.store.lock().unwrap();
    match position(&store.users, id) {
        Some(index) => {
            store.users.remove(index);
            empty(StatusCode::OK)
        }
        None => empty(StatusCode::NOT_FOUND),
    }
}

async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let mut store = state.store.lock().unwrap();
    if let Err(denied) = authorize(&mut store, &headers) {
        return denied;
    }

    let pairs: Vec<(String, String)> = query
        .as_deref()
        .map(|q| serde_urlencoded::from_str(q).unwrap_or_default())
        .unwrap_or_default();
    let ids: Vec<u64> = pairs
        .iter()
        .filter(|(k, _)| k == "id")
        .filter_map(|(_, v)| v.parse().ok())
        .collect();

    let posts: Vec<Value> = store
        .posts
        .iter()
        .filter(|p| ids.is_empty() || p["id"].as_u64().is_some_and(|id| ids.contains(&id)))
        .cloned()
        .map(|mut p| {
            if state.drift.leak_user_id {
                p["userId"] = json!(1);
            }
            p
        })
        .collect();
    json_response(StatusCode::OK, Value::Array(posts))
}

async fn get_post(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    let mut store = state.store.lock().unwrap();
    if let Err(denied) = authorize(&mut store, &headers) {
        return denied;
    }
    match position(&store.posts, id) {
        Some(index) => json_response(StatusCode::OK, store.posts[index].clone()),
        None => empty(StatusCode::NOT_FOUND),
    }
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    if let Err(denied) = authorize(&mut store, &headers) {
        return denied;
    }
    let Some(id) = body["id"].as_u64() else {
        return json_response(StatusCode::BAD_REQUEST, json!("id is required"));
    };
    if position(&store.posts, id).is_some() {
        if state.drift.conflict_on_duplicate {
            return json_response(StatusCode::CONFLICT, json!({"error": "duplicate id"}));
        }
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "text/html; charset=utf-8")],
            "Error: Insert failed, duplicate id\n    at Function.insert (node_modules/lodash-id/src/index.js:49:15)",
        )
            .into_response();
    }
    store.posts.push(body.clone());
    json_response(StatusCode::CREATED, body)
}

async fn replace_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    if let Err(denied) = authorize(&mut store, &headers) {
        return denied;
    }
    body["id"] = json!(id);
    match position(&store.posts, id) {
        Some(index) => {
            store.posts[index] = body.clone();
            json_response(StatusCode::OK, body)
        }
        None if state.drift.upsert_on_put => {
            store.posts.push(body.clone());
            json_response(StatusCode::OK, body)
        }
        None => empty(StatusCode::NOT_FOUND),
    }
}

async fn patch_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    if let Err(denied) = authorize(&mut store, &headers) {
        return denied;
    }
    let Some(index) = position(&store.posts, id) else {
        return empty(StatusCode::NOT_FOUND);
    };
    if let (Some(stored), Some(fields)) = (store.posts[index].as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            if key != "id" {
                stored.insert(key.clone(), value.clone());
            }
        }
    }
    json_response(StatusCode::OK, store.posts[index].clone())
}

async fn delete_post(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    let mut store = state.store.lock().unwrap();
    if let Err(denied) = authorize(&mut store, &headers) {
        return denied;
    }
    match position(&store.posts, id) {
        Some(index) => {
            store.posts.remove(index);
            empty(StatusCode::OK)
        }
        None => {
            if state.drift.stub_on_missing_delete {
                store.posts.push(json!({"id": id}));
            }
            empty(StatusCode::NOT_FOUND)
        }
    }
}
