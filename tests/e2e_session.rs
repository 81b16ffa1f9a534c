//! End-to-end suite: a real listener, driven by a client that models the
//! frontend session store (token held across requests, dropped on 401) and
//! data cache (full re-fetch after every mutation).

use serde_json::{json, Value};

use alumnet::{app::build_app, state::AppState};

/// Client-side session: base url, the bearer token when logged in, and the
/// last fetched post list.
struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
    cached_posts: Vec<Value>,
}

impl ApiClient {
    fn new(base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
            token: None,
            cached_posts: Vec::new(),
        }
    }

    async fn request(
        &mut self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> (u16, Value) {
        let mut req = self.http.request(method, format!("{}{path}", self.base));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.expect("send request");
        let status = response.status().as_u16();
        // The frontend drops its session whenever the server answers 401.
        if status == 401 {
            self.token = None;
        }
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn register(&mut self, username: &str, email: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                reqwest::Method::POST,
                "/api/auth/register",
                Some(&json!({ "username": username, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, 201, "register failed: {body}");
        self.token = body["token"].as_str().map(str::to_string);
        body["user"].clone()
    }

    async fn login(&mut self, email: &str, password: &str) -> u16 {
        let (status, body) = self
            .request(
                reqwest::Method::POST,
                "/api/auth/login",
                Some(&json!({ "email": email, "password": password })),
            )
            .await;
        if status == 200 {
            self.token = body["token"].as_str().map(str::to_string);
        }
        status
    }

    fn logout(&mut self) {
        // Purely client-side; the token itself stays valid until expiry.
        self.token = None;
    }

    /// Full re-fetch of the post collection into the cache.
    async fn refresh_posts(&mut self) {
        let (status, body) = self.request(reqwest::Method::GET, "/api/posts", None).await;
        assert_eq!(status, 200);
        self.cached_posts = body.as_array().cloned().expect("post array");
    }
}

async fn spawn_server() -> String {
    let app = build_app(AppState::fake());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn ownership_scenario_end_to_end() {
    let base = spawn_server().await;
    let mut alice = ApiClient::new(base.clone());
    let mut bob = ApiClient::new(base);

    // Register A, then prove a fresh login works too.
    alice.register("alice", "alice@x.com", "secret1").await;
    alice.logout();
    assert_eq!(alice.login("alice@x.com", "secret1").await, 200);

    // A creates a post and re-fetches her cache.
    let (status, post) = alice
        .request(
            reqwest::Method::POST,
            "/api/posts",
            Some(&json!({ "title": "P", "content": "original content", "type": "blog" })),
        )
        .await;
    assert_eq!(status, 201);
    let post_id = post["id"].as_str().expect("post id").to_string();
    alice.refresh_posts().await;
    assert_eq!(alice.cached_posts.len(), 1);

    // B, with a perfectly valid token of his own, may not touch it.
    bob.register("bob", "bob@x.com", "secret2").await;
    let (status, body) = bob
        .request(
            reqwest::Method::PUT,
            &format!("/api/posts/{post_id}"),
            Some(&json!({ "content": "bob's edit" })),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Not authorized");
    assert!(bob.token.is_some(), "a 403 does not end the session");

    // A may.
    let (status, body) = alice
        .request(
            reqwest::Method::PUT,
            &format!("/api/posts/{post_id}"),
            Some(&json!({ "content": "updated content" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["content"], "updated content");

    // The cache only sees the edit after the re-fetch.
    assert_eq!(alice.cached_posts[0]["content"], "original content");
    alice.refresh_posts().await;
    assert_eq!(alice.cached_posts[0]["content"], "updated content");
}

#[tokio::test]
async fn session_drops_on_unauthenticated_response() {
    let base = spawn_server().await;
    let mut client = ApiClient::new(base);
    client.register("carol", "carol@x.com", "secret1").await;

    // Simulate a corrupted persisted token, e.g. a stale localStorage entry.
    client.token = Some("stale-or-tampered".into());
    let (status, _) = client
        .request(
            reqwest::Method::POST,
            "/api/posts",
            Some(&json!({ "title": "t", "content": "c", "type": "blog" })),
        )
        .await;
    assert_eq!(status, 401);
    assert!(client.token.is_none(), "401 clears the session");

    // Logging back in restores a working session.
    assert_eq!(client.login("carol@x.com", "secret1").await, 200);
    let (status, _) = client
        .request(
            reqwest::Method::POST,
            "/api/posts",
            Some(&json!({ "title": "t", "content": "c", "type": "blog" })),
        )
        .await;
    assert_eq!(status, 201);
}

#[tokio::test]
async fn reads_are_public_but_mutations_are_not() {
    let base = spawn_server().await;
    let mut visitor = ApiClient::new(base);

    let (status, body) = visitor.request(reqwest::Method::GET, "/api/posts", None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().expect("array").len(), 0);

    let (status, _) = visitor
        .request(
            reqwest::Method::POST,
            "/api/posts",
            Some(&json!({ "title": "t", "content": "c", "type": "blog" })),
        )
        .await;
    assert_eq!(status, 401);
}
