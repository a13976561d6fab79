//! Integration test harness for the Atelier console.
//!
//! Each test starts a [`MockBackend`] that speaks the content REST API on an
//! ephemeral port, then a real console server pointed at it. The tests drive
//! the console over HTTP with a cookie-keeping client, exactly as a browser
//! would, and inspect what the backend received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use reqwest::{Client, redirect};
use serde_json::{Value, json};
use url::Url;

use atelier_console::config::ConsoleConfig;
use atelier_console::state::AppState;
use atelier_core::AdminRole;

/// Password every fixture account accepts.
pub const PASSWORD: &str = "correct-horse-battery";

/// Super admin fixture account.
pub const SUPER_ADMIN: &str = "root@atelier.test";

/// Admin fixture account.
pub const ADMIN: &str = "ops@atelier.test";

/// Product manager fixture account.
pub const PRODUCT_MANAGER: &str = "catalog@atelier.test";

/// Page size the test console asks the backend for.
pub const PAGE_SIZE: u32 = 4;

/// Total pages the backend reports for the leaf category `c1`.
pub const LAMP_PAGES: u32 = 3;

const ACCOUNTS: [(&str, AdminRole); 3] = [
    (SUPER_ADMIN, AdminRole::SuperAdmin),
    (ADMIN, AdminRole::Admin),
    (PRODUCT_MANAGER, AdminRole::Product),
];

// =============================================================================
// Mock backend
// =============================================================================

/// One request the backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub token: Option<String>,
    pub body: Value,
}

impl Recorded {
    /// Value of a query parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct BackendState {
    requests: Mutex<Vec<Recorded>>,
    tokens_revoked: AtomicBool,
    assets_locked: AtomicBool,
}

/// A fake content API with a small fixed catalog.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl MockBackend {
    /// Start the backend on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        Self { addr, state }
    }

    /// Base URL of the backend API.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Invalid mock backend URL")
    }

    /// Reject every token from now on, as the backend does when they expire.
    pub fn revoke_tokens(&self) {
        self.state.tokens_revoked.store(true, Ordering::SeqCst);
    }

    /// Answer 401 to media removal while every other call still succeeds.
    pub fn expire_on_asset_removal(&self) {
        self.state.assets_locked.store(true, Ordering::SeqCst);
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state
            .requests
            .lock()
            .expect("Request log poisoned")
            .clone()
    }

    /// Requests received for `method` and `path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == *method && r.path == path)
            .collect()
    }

    /// Forget the requests received so far.
    pub fn clear(&self) {
        self.state
            .requests
            .lock()
            .expect("Request log poisoned")
            .clear();
    }
}

fn token_for(email: &str) -> String {
    format!("token-{email}")
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn acknowledged(message: &str) -> Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

fn rejected(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn product(id: &str, name: &str, price: f64) -> Value {
    json!({ "_id": id, "name": name, "price": price, "isVisible": true })
}

fn categories() -> Value {
    json!([
        { "_id": "c1", "name": "Lamps", "isVisible": true, "subCategories": [] },
        {
            "_id": "c2",
            "name": "Furniture",
            "isVisible": true,
            "subCategories": [
                { "_id": "c3", "name": "Chairs", "parentId": "c2", "isVisible": true }
            ]
        }
    ])
}

fn lamp_page(page: u32) -> Value {
    json!({
        "products": [
            product(&format!("lamp-{page}-a"), &format!("Lamp page {page} A"), 120.5),
            product(&format!("lamp-{page}-b"), &format!("Lamp page {page} B"), 64.0),
        ],
        "pages": LAMP_PAGES,
    })
}

fn admins() -> Value {
    let admins: Vec<Value> = ACCOUNTS
        .iter()
        .enumerate()
        .map(|(i, (email, role))| {
            json!({
                "_id": format!("a{i}"),
                "email": email,
                "role": role.as_str(),
                "isActive": true,
                "createdAt": "2026-03-01T09:30:00Z",
            })
        })
        .collect();
    json!({
        "admins": admins,
        "pagination": { "page": 1, "limit": 10, "total": ACCOUNTS.len(), "pages": 1 }
    })
}

fn login(body: &Value) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match ACCOUNTS.iter().find(|(account, _)| *account == email) {
        Some((account, role)) if password == PASSWORD => ok(json!({
            "token": token_for(account),
            "email": account,
            "role": role.as_str(),
        })),
        _ => rejected(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query: Vec<(String, String)> = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    let recorded = Recorded {
        method: method.clone(),
        path: uri.path().to_owned(),
        query,
        token: headers
            .get("x-access-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state
        .requests
        .lock()
        .expect("Request log poisoned")
        .push(recorded.clone());

    let path = recorded.path.as_str();
    if method == Method::PUT && path == "/login" {
        return login(&recorded.body);
    }
    if path == "/" {
        return "ok".into_response();
    }

    let authorized = !state.tokens_revoked.load(Ordering::SeqCst)
        && recorded
            .token
            .as_deref()
            .is_some_and(|t| ACCOUNTS.iter().any(|(email, _)| token_for(email) == t));
    if !authorized {
        return rejected(StatusCode::UNAUTHORIZED, "Token expired");
    }

    match (&method, path) {
        (&Method::GET, "/categories") => ok(categories()),
        (&Method::GET, "/categories/c1") => ok(categories()[0].clone()),
        (&Method::GET, "/categories/c2") => ok(categories()[1].clone()),
        (&Method::GET, "/categories/products/c1") => {
            let page = recorded
                .param("page")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1);
            ok(lamp_page(page))
        }
        (&Method::POST, "/product/searchByName") => {
            let text = recorded.body["query"]
                .as_str()
                .unwrap_or_default()
                .to_lowercase();
            let hits: Vec<Value> = [
                product("p1", "Brass lamp", 80.0),
                product("p2", "Paper lamp", 40.0),
                product("p3", "Oak stool", 150.0),
            ]
            .into_iter()
            .filter(|p| {
                p["name"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(&text))
            })
            .collect();
            ok(Value::Array(hits))
        }
        (&Method::POST, "/updateDiscounts") => acknowledged("Discount applied"),
        (&Method::POST, "/updatePrice") => acknowledged("Prices adjusted"),
        (&Method::POST, "/products") => acknowledged("Product saved"),
        (&Method::GET, "/products/lamp-1-a") => ok(json!({
            "_id": "lamp-1-a",
            "name": "Lamp page 1 A",
            "price": 120.5,
            "categoryId": "c1",
            "isVisible": true,
        })),
        (&Method::DELETE, p) if p.starts_with("/products/") => acknowledged("Product deleted"),
        (&Method::DELETE, p) if p.starts_with("/banners/") => acknowledged("Banner deleted"),
        (&Method::DELETE, "/asset") => {
            if state.assets_locked.load(Ordering::SeqCst) {
                rejected(StatusCode::UNAUTHORIZED, "Token expired")
            } else {
                acknowledged("Assets removed")
            }
        }
        (&Method::GET, "/admins") => ok(admins()),
        (&Method::GET, "/banners" | "/portfolios" | "/testimonials" | "/wishlists") => {
            ok(json!([]))
        }
        _ => rejected(StatusCode::NOT_FOUND, "Not found"),
    }
}

// =============================================================================
// Console under test
// =============================================================================

/// A running console wired to a [`MockBackend`].
pub struct TestContext {
    pub client: Client,
    pub console_url: String,
    pub backend: MockBackend,
}

impl TestContext {
    /// Start a backend and a console in front of it.
    pub async fn new() -> Self {
        let backend = MockBackend::start().await;
        let state = AppState::new(test_config(backend.url()))
            .expect("Failed to create application state");
        let app = atelier_console::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind console");
        let addr = listener.local_addr().expect("Console has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Console failed");
        });

        Self {
            client: browser(),
            console_url: format!("http://{addr}"),
            backend,
        }
    }

    /// Absolute console URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.console_url)
    }

    /// Sign in through the login form.
    pub async fn sign_in(&self, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", PASSWORD)])
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET a console page.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET a console fragment the way htmx requests it.
    pub async fn htmx_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("htmx GET request failed")
    }

    /// POST a form the way htmx does.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("htmx POST request failed")
    }

    /// POST a plain form.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }
}

/// A client that keeps cookies and reports redirects instead of following them.
#[must_use]
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Console configuration for tests: plain HTTP, no debounce, small pages.
#[must_use]
pub fn test_config(api_url: Url) -> ConsoleConfig {
    ConsoleConfig {
        api_url,
        media_cloud: "atelier-test".to_string(),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        page_size: PAGE_SIZE,
        search_debounce: Duration::ZERO,
        api_timeout: Duration::from_secs(5),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// Location header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
