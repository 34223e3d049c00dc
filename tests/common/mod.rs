//! In-process fake of the Vault API for driving the blocking client.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use vault_client::storage::{ACCESS_TOKEN, MemoryStore, REFRESH_TOKEN};
use vault_client::{ApiClient, Session};

pub const VALID_TOKEN: &str = "valid-access";
pub const REFRESH: &str = "refresh-1";
pub const PASSWORD: &str = "correct horse";
pub const POST_COUNT: i64 = 12;

#[derive(Default)]
pub struct Recorded {
    pub requests: Vec<String>,
    pub authorization: Vec<Option<String>>,
    pub posts: Vec<Value>,
    pub liked: HashSet<i64>,
    pub repositories: Vec<Value>,
    pub files: Vec<Value>,
    pub commits: Vec<Value>,
    pub profile_delay: Option<Duration>,
    /// Listing requests answer 500 while set.
    pub listing_down: bool,
}

pub type Shared = Arc<Mutex<Recorded>>;

pub struct FakeVault {
    pub base_url: String,
    pub state: Shared,
}

impl FakeVault {
    pub fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(seed()));
        let app = router(state.clone());

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self { base_url: format!("http://{addr}/api"), state }
    }

    pub fn state(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.state().requests.iter().filter(|r| r.as_str() == line).count()
    }

    /// Client whose session holds a valid token pair.
    pub fn signed_in(&self) -> ApiClient {
        let store = MemoryStore::new().with(ACCESS_TOKEN, VALID_TOKEN).with(REFRESH_TOKEN, REFRESH);
        ApiClient::with_base_url(&self.base_url, Session::init(store))
    }

    /// Client whose stored token the server will reject.
    pub fn stale(&self) -> ApiClient {
        let store = MemoryStore::new().with(ACCESS_TOKEN, "expired-token").with(REFRESH_TOKEN, REFRESH);
        ApiClient::with_base_url(&self.base_url, Session::init(store))
    }

    pub fn anonymous(&self) -> ApiClient {
        ApiClient::with_base_url(&self.base_url, Session::init(MemoryStore::new()))
    }
}

/// Base URL nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

fn seed() -> Recorded {
    let posts = (1..=POST_COUNT)
        .rev()
        .map(|id| {
            let comments = if id == 1 {
                json!([{"id": 100, "authorUsername": "bob", "content": "first!", "createdAt": "2024-05-01T11:00:00"}])
            } else {
                json!([])
            };
            json!({
                "id": id,
                "authorUsername": "ana",
                "title": format!("Post {id}"),
                "content": format!("Body of post {id}"),
                "createdAt": "2024-05-01T10:00:00",
                "likeCount": 2,
                "liked": false,
                "comments": comments,
            })
        })
        .collect();

    Recorded {
        posts,
        repositories: vec![
            json!({"id": 1, "name": "vault-core", "description": "Core services", "language": "Java"}),
            json!({"id": 2, "name": "dotfiles", "description": null, "language": null}),
        ],
        files: vec![
            json!({"fileName": "main.rs", "filePath": "src/main.rs", "size": 120, "updatedAt": "2024-05-01T10:00:00"}),
            json!({"fileName": "README.md", "filePath": "README.md", "size": 40, "updatedAt": "2024-05-01T10:00:00"}),
        ],
        commits: vec![json!({
            "hash": "a1b2c3d4e5f60718293a4b5c6d7e8f9012345678",
            "message": "Initial import\n\nSeeded repository",
            "authorName": "Ana",
            "createdAt": "2024-05-01T10:00:00",
            "files": ["src/main.rs", "README.md"],
        })],
        ..Recorded::default()
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/signup", post(signup))
        .route("/api/user/profile", get(profile))
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/{id}/like", post(toggle_like))
        .route("/api/posts/{id}/comments", get(list_comments).post(add_comment))
        .route("/api/repositories", get(list_repositories).post(create_repository))
        .route("/api/repositories/public", get(public_repositories))
        .route("/api/repositories/{id}/files", get(repository_files))
        .route("/api/git/repositories/{id}/commits", get(list_commits))
        .route("/api/git/repositories/{id}/commit", post(create_commit))
        .route(
            "/api/git/repositories/{id}/files",
            get(repository_files).post(upload_file).delete(delete_file),
        )
        .route("/api/git/repositories/{id}/files/download", get(download))
        .route("/api/git/repositories/{id}/files/url", get(download_url))
        .route("/api/git/commits/{hash}", get(commit))
        .route("/api/git/commits/{hash}/files", get(commit_files))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    let auth = request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(String::from);
    {
        let mut s = state.lock().unwrap();
        s.requests.push(line);
        s.authorization.push(auth);
    }
    next.run(request).await
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {VALID_TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(v) if v == expected => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, json!({"error": "Invalid or expired token"}))),
    }
}

fn known_repository(id: i64) -> Result<(), Response> {
    if id == 404 {
        return Err(error(StatusCode::NOT_FOUND, json!({"error": "Repository not found"})));
    }
    Ok(())
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn signin(Json(c): Json<Credentials>) -> Response {
    if c.email.starts_with("banned") {
        return error(StatusCode::FORBIDDEN, json!({}));
    }
    if c.email.starts_with("legacy") {
        return Json(json!({"token": VALID_TOKEN})).into_response();
    }
    if c.password != PASSWORD {
        return error(StatusCode::BAD_REQUEST, json!({"message": "Invalid email or password"}));
    }
    Json(json!({"access_token": VALID_TOKEN, "refresh_token": REFRESH})).into_response()
}

async fn signup(Json(body): Json<Value>) -> Response {
    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default().to_string();
    if field("firstName").is_empty() || field("lastName").is_empty() {
        return error(StatusCode::BAD_REQUEST, json!({"message": "Name is required"}));
    }
    if field("email").contains("taken") {
        return error(StatusCode::UNPROCESSABLE_ENTITY, json!({"message": "Email already registered"}));
    }
    Json(json!({"access_token": VALID_TOKEN})).into_response()
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Response> {
    let delay = state.lock().unwrap().profile_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    authorize(&headers)?;
    Ok(Json(json!({"email": "ana@example.com", "username": "ana"})))
}

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
    size: usize,
}

async fn list_posts(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let s = state.lock().unwrap();
    let total_pages = s.posts.len().div_ceil(q.size);
    let content: Vec<Value> = s.posts.iter().skip(q.page * q.size).take(q.size).cloned().collect();
    Ok(Json(json!({"content": content, "number": q.page, "totalPages": total_pages})))
}

async fn create_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let mut s = state.lock().unwrap();
    let id = s.posts.len() as i64 + 1;
    let post = json!({
        "id": id,
        "authorUsername": "ana",
        "title": body["title"],
        "content": body["content"],
        "createdAt": "2024-06-01T09:00:00",
        "likeCount": 0,
        "liked": false,
        "comments": [],
    });
    s.posts.insert(0, post.clone());
    Ok(Json(post))
}

async fn toggle_like(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let mut s = state.lock().unwrap();
    let liked = if s.liked.remove(&id) { false } else { s.liked.insert(id) };
    Ok(Json(json!({"liked": liked})))
}

async fn list_comments(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let s = state.lock().unwrap();
    let comments = s.posts.iter().find(|p| p["id"] == id).map(|p| p["comments"].clone());
    comments
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, json!({"error": "Post not found"})))
}

async fn add_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let mut s = state.lock().unwrap();
    let post = s
        .posts
        .iter_mut()
        .find(|p| p["id"] == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, json!({"error": "Post not found"})))?;

    let comments = post["comments"].as_array_mut().unwrap();
    let comment = json!({
        "id": 200 + comments.len() as i64,
        "authorUsername": "ana",
        "content": body["content"],
        "createdAt": "2024-06-01T09:30:00",
    });
    comments.push(comment.clone());
    Ok(Json(comment))
}

async fn list_repositories(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    Ok(Json(Value::Array(state.lock().unwrap().repositories.clone())))
}

async fn public_repositories(headers: HeaderMap) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    Ok(Json(json!([{"id": 7, "name": "awesome-list", "description": "Shared links", "language": "Markdown"}])))
}

async fn create_repository(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let mut s = state.lock().unwrap();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    if s.repositories.iter().any(|r| r["name"] == name.as_str()) {
        return Err(error(StatusCode::CONFLICT, json!({"error": "Repository name already exists"})));
    }
    let repo = json!({
        "id": s.repositories.len() as i64 + 1,
        "name": name,
        "description": body.get("description").cloned().unwrap_or(Value::Null),
        "language": null,
    });
    s.repositories.push(repo.clone());
    Ok(Json(repo))
}

async fn repository_files(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    known_repository(id)?;
    let s = state.lock().unwrap();
    listing_up(&s)?;
    Ok(Json(Value::Array(s.files.clone())))
}

async fn list_commits(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    known_repository(id)?;
    let s = state.lock().unwrap();
    listing_up(&s)?;
    Ok(Json(Value::Array(s.commits.clone())))
}

fn listing_up(s: &Recorded) -> Result<(), Response> {
    if s.listing_down {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "db down"})));
    }
    Ok(())
}

fn bad_request(e: impl std::fmt::Display) -> Response {
    error(StatusCode::BAD_REQUEST, json!({"error": e.to_string()}))
}

async fn create_commit(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    known_repository(id)?;

    let mut message = String::new();
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" => message = field.text().await.map_err(bad_request)?,
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                field.bytes().await.map_err(bad_request)?;
                files.push(file_name);
            }
            _ => {}
        }
    }

    let mut s = state.lock().unwrap();
    let commit = json!({
        "hash": format!("{:040x}", s.commits.len() + 1),
        "message": message,
        "authorName": "Ana",
        "createdAt": "2024-06-01T12:00:00",
        "files": files,
    });
    s.commits.insert(0, commit.clone());
    Ok(Json(commit))
}

async fn upload_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    known_repository(id)?;

    let mut file_name = String::new();
    let mut size = 0;
    let mut file_path = String::new();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                size = field.bytes().await.map_err(bad_request)?.len();
            }
            "filePath" => file_path = field.text().await.map_err(bad_request)?,
            _ => {}
        }
    }

    if file_name.is_empty() {
        return Err(bad_request("Missing 'file' field in multipart form"));
    }
    if file_path.is_empty() {
        file_path.clone_from(&file_name);
    }

    state.lock().unwrap().files.push(json!({
        "fileName": file_name,
        "filePath": file_path,
        "size": size,
        "updatedAt": "2024-06-01T12:30:00",
    }));
    Ok(Json(json!({"message": "File uploaded"})))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileQuery {
    file_name: String,
    file_path: String,
}

async fn delete_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(q): Query<FileQuery>,
) -> Result<StatusCode, Response> {
    authorize(&headers)?;
    known_repository(id)?;

    let mut s = state.lock().unwrap();
    let before = s.files.len();
    s.files.retain(|f| !(f["fileName"] == q.file_name.as_str() && f["filePath"] == q.file_path.as_str()));
    if s.files.len() == before {
        return Err(error(StatusCode::NOT_FOUND, json!({"error": "File not found"})));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn download(headers: HeaderMap, Path(id): Path<i64>, Query(q): Query<FileQuery>) -> Result<Vec<u8>, Response> {
    authorize(&headers)?;
    known_repository(id)?;
    Ok(format!("contents of {}", q.file_path).into_bytes())
}

async fn download_url(
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(q): Query<FileQuery>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    Ok(Json(json!({"downloadUrl": format!("https://cdn.vault.test/{id}/{}", q.file_path)})))
}

async fn commit(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let s = state.lock().unwrap();
    s.commits
        .iter()
        .find(|c| c["hash"] == hash.as_str())
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, json!({"error": "Commit not found"})))
}

async fn commit_files(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> Result<Json<Value>, Response> {
    authorize(&headers)?;
    let s = state.lock().unwrap();
    s.commits
        .iter()
        .find(|c| c["hash"] == hash.as_str())
        .map(|c| Json(c["files"].clone()))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, json!({"error": "Commit not found"})))
}
