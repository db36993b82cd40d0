//! End-to-end tests for the JSON API, driven through the real router with
//! in-memory repository doubles. No Postgres or cache daemon required.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use foglio::application::accounts::AccountService;
use foglio::application::blog::BlogService;
use foglio::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, CreatePostParams, CreateTokenParams,
    CreateUserParams, PostListing, PostWithAuthor, PostsRepo, RepoError, TokensRepo, UsersRepo,
};
use foglio::cache::{CacheConfig, MemoryStore, ReadCache};
use foglio::domain::entities::{
    AuthTokenRecord, AuthorRef, CommentRecord, PostRecord, UserRecord,
};
use foglio::infra::http::{ApiState, build_api_router};

#[derive(Default)]
struct MemoryRepos {
    users: Mutex<Vec<UserRecord>>,
    tokens: Mutex<Vec<AuthTokenRecord>>,
    posts: Mutex<Vec<PostRecord>>,
    comments: Mutex<Vec<CommentRecord>>,
}

impl MemoryRepos {
    async fn author_ref(&self, id: Uuid) -> AuthorRef {
        let users = self.users.lock().await;
        let user = users
            .iter()
            .find(|u| u.id == id)
            .expect("author should exist");
        AuthorRef::from(user)
    }

    async fn post_count(&self) -> usize {
        self.posts.lock().await.len()
    }

    async fn comment_count(&self) -> usize {
        self.comments.lock().await.len()
    }
}

#[async_trait]
impl UsersRepo for MemoryRepos {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            email: params.email,
            first_name: params.first_name,
            last_name: params.last_name,
            password_hash: params.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl TokensRepo for MemoryRepos {
    async fn create_token(
        &self,
        params: CreateTokenParams,
    ) -> Result<AuthTokenRecord, RepoError> {
        let record = AuthTokenRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            created_at: OffsetDateTime::now_utc(),
            last_used_at: None,
            expires_at: params.expires_at,
        };
        self.tokens.lock().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AuthTokenRecord>, RepoError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().find(|t| t.prefix == prefix).cloned())
    }

    async fn touch_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn list_with_comment_counts(&self) -> Result<Vec<PostListing>, RepoError> {
        let posts = self.posts.lock().await.clone();
        let comments = self.comments.lock().await;
        let mut listings = Vec::with_capacity(posts.len());
        for post in posts {
            listings.push(PostListing {
                id: post.id,
                title: post.title.clone(),
                author: self.author_ref(post.author_id).await,
                comment_count: comments.iter().filter(|c| c.post_id == post.id).count()
                    as i64,
                created_at: post.created_at,
            });
        }
        Ok(listings)
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let post = {
            let posts = self.posts.lock().await;
            posts.iter().find(|p| p.id == id).cloned()
        };
        match post {
            Some(post) => {
                let author = self.author_ref(post.author_id).await;
                Ok(Some(PostWithAuthor { post, author }))
            }
            None => Ok(None),
        }
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            content: params.content,
            author_id: params.author_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().await.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepos {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let comments = {
            let guard = self.comments.lock().await;
            guard
                .iter()
                .filter(|c| c.post_id == post_id)
                .cloned()
                .collect::<Vec<_>>()
        };
        let mut with_authors = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = self.author_ref(comment.author_id).await;
            with_authors.push(CommentWithAuthor { comment, author });
        }
        Ok(with_authors)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            content: params.content,
            created_at: now,
            updated_at: now,
        };
        self.comments.lock().await.push(record.clone());
        Ok(record)
    }
}

struct Harness {
    app: Router,
    repos: Arc<MemoryRepos>,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let repos = Arc::new(MemoryRepos::default());
    let config = CacheConfig::default();
    let store = Arc::new(MemoryStore::new(&config));
    let cache = ReadCache::new(store.clone(), config);

    let state = ApiState {
        accounts: Arc::new(AccountService::new(repos.clone(), repos.clone())),
        blog: Arc::new(BlogService::new(repos.clone(), repos.clone(), cache)),
    };

    Harness {
        app: build_api_router(state),
        repos,
        store,
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, body)
}

fn register_payload(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "opensesame-123",
        "password_confirm": "opensesame-123",
    })
}

/// Register a user and log in through the API, returning the raw token.
async fn signup(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            register_payload(username),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"username": username, "password": "opensesame-123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token in response").to_string()
}

#[tokio::test]
async fn register_login_profile_round_trip() {
    let h = harness();

    let (status, user) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            register_payload("ada"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], "ada");
    assert_eq!(user["email"], "ada@example.com");
    assert!(user.get("password_hash").is_none());

    let (status, session) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"username": "ada", "password": "opensesame-123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().expect("token");
    assert!(token.starts_with("bk_"));
    assert_eq!(session["user"]["username"], "ada");

    let (status, profile) = send(&h.app, get_request("/api/auth/profile", Some(token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "ada");
    assert_eq!(profile["id"], user["id"]);
}

#[tokio::test]
async fn register_rejects_password_mismatch() {
    let h = harness();
    let mut payload = register_payload("ada");
    payload["password_confirm"] = json!("something-else");

    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/api/auth/register", None, payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["message"], "Passwords do not match");
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let h = harness();
    signup(&h.app, "ada").await;

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            register_payload("ada"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["hint"], "username");
}

#[tokio::test]
async fn register_rejects_blank_username() {
    let h = harness();
    let mut payload = register_payload("ada");
    payload["username"] = json!("   ");

    let (status, body) = send(
        &h.app,
        json_request(Method::POST, "/api/auth/register", None, payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["hint"], "username");
}

#[tokio::test]
async fn login_failures_are_uniform_bad_requests() {
    let h = harness();
    signup(&h.app, "ada").await;

    // wrong password
    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"username": "ada", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid credentials");

    // unknown username gets the same response
    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"username": "nobody", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid credentials");

    // missing password field
    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"username": "ada"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["hint"], "password");
}

#[tokio::test]
async fn profile_requires_a_credential() {
    let h = harness();

    let (status, body) = send(&h.app, get_request("/api/auth/profile", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "not_authenticated");

    let (status, body) = send(
        &h.app,
        get_request(
            "/api/auth/profile",
            Some("bk_bogusprefix_0123456789abcdef0123456789abcdef"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_token");
}

#[tokio::test]
async fn token_scheme_is_accepted_as_bearer_alias() {
    let h = harness();
    let token = signup(&h.app, "ada").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/profile")
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .body(Body::empty())
        .expect("request should build");
    let (status, profile) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "ada");
}

#[tokio::test]
async fn post_and_comment_lifecycle() {
    let h = harness();
    let token_a = signup(&h.app, "alice").await;
    let token_b = signup(&h.app, "bob").await;

    let (status, post) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/posts",
            Some(&token_a),
            json!({"title": "Test Post", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["title"], "Test Post");
    assert_eq!(post["author"]["username"], "alice");
    let post_id = post["id"].as_str().expect("post id").to_string();

    let (status, listing) = send(&h.app, get_request("/api/posts", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["results"][0]["comment_count"], 0);
    assert_eq!(listing["results"][0]["author"]["username"], "alice");

    let (status, comment) = send(
        &h.app,
        json_request(
            Method::POST,
            &format!("/api/posts/{post_id}/comments"),
            Some(&token_b),
            json!({"content": "12345"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["content"], "12345");
    assert_eq!(comment["author"]["username"], "bob");

    let (status, detail) = send(
        &h.app,
        get_request(&format!("/api/posts/{post_id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comments = detail["comments"].as_array().expect("comments array");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["author"]["username"], "bob");

    let (_, listing) = send(&h.app, get_request("/api/posts", None)).await;
    assert_eq!(listing["results"][0]["comment_count"], 1);
}

#[tokio::test]
async fn create_post_trims_title_and_rejects_blank() {
    let h = harness();
    let token = signup(&h.app, "ada").await;

    let (status, post) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/posts",
            Some(&token),
            json!({"title": "  Padded Title  ", "content": "body"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["title"], "Padded Title");

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/posts",
            Some(&token),
            json!({"title": "   ", "content": "body"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["hint"], "title");
}

#[tokio::test]
async fn short_comment_is_rejected_and_not_persisted() {
    let h = harness();
    let token = signup(&h.app, "ada").await;

    let (_, post) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/posts",
            Some(&token),
            json!({"title": "Test Post", "content": "x"}),
        ),
    )
    .await;
    let post_id = post["id"].as_str().expect("post id").to_string();

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            &format!("/api/posts/{post_id}/comments"),
            Some(&token),
            json!({"content": "Hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["hint"], "content");
    assert_eq!(h.repos.comment_count().await, 0);
}

#[tokio::test]
async fn comment_on_unknown_post_is_not_found() {
    let h = harness();
    let token = signup(&h.app, "ada").await;

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            &format!("/api/posts/{}/comments", Uuid::new_v4()),
            Some(&token),
            json!({"content": "long enough"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn unknown_post_detail_is_not_found() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        get_request(&format!("/api/posts/{}", Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn unauthenticated_write_persists_nothing_and_keeps_the_cache() {
    let h = harness();

    // warm the list projection
    let (status, _) = send(&h.app, get_request("/api/posts", None)).await;
    assert_eq!(status, StatusCode::OK);
    let cached_before = h.store.len();
    assert_eq!(cached_before, 1);

    let (status, body) = send(
        &h.app,
        json_request(
            Method::POST,
            "/api/posts",
            None,
            json!({"title": "Sneaky", "content": "body"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "not_authenticated");

    assert_eq!(h.repos.post_count().await, 0);
    assert_eq!(h.store.len(), cached_before);
}
