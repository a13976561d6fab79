//! Integration tests for signing in and out of the console.

use reqwest::{Method, StatusCode};

use atelier_integration_tests::{ADMIN, PASSWORD, TestContext, location};

// ===== Health =====

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx.get("/health/ready").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// ===== Login =====

#[tokio::test]
async fn test_pages_require_login() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));

    let resp = ctx.htmx_get("/products/discount/search?q=lamp").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["hx-redirect"], "/login");
}

#[tokio::test]
async fn test_login_then_browse_with_token() {
    let ctx = TestContext::new().await;

    let resp = ctx.sign_in(ADMIN).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let resp = ctx.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Lamps"));
    assert!(body.contains("Furniture"));

    let fetches = ctx.backend.requests_to(&Method::GET, "/categories");
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].token.as_deref(), Some("token-ops@atelier.test"));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post("/login", &[("email", ADMIN), ("password", "not-it")])
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));

    let resp = ctx.get("/").await;
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
async fn test_malformed_email_never_reaches_backend() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post("/login", &[("email", "not-an-email"), ("password", PASSWORD)])
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Please enter a valid email address")
    );
    assert!(ctx.backend.requests_to(&Method::PUT, "/login").is_empty());

    let resp = ctx.post("/login", &[("email", ""), ("password", "")]).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Email and password are required")
    );
}

// ===== Logout =====

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::new().await;
    ctx.sign_in(ADMIN).await;
    assert_eq!(ctx.get("/").await.status(), StatusCode::OK);

    let resp = ctx.post("/logout", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));

    let resp = ctx.get("/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));
}
