//! Integration tests for backend token expiry.
//!
//! Once the backend answers 401 the console must forget the operator and
//! send the browser back to the login page with a notice.

use reqwest::{Method, StatusCode};

use atelier_integration_tests::{ADMIN, PRODUCT_MANAGER, SUPER_ADMIN, TestContext, location};

#[tokio::test]
async fn test_expired_token_signs_operator_out() {
    let ctx = TestContext::new().await;
    ctx.sign_in(ADMIN).await;
    assert_eq!(ctx.get("/").await.status(), StatusCode::OK);

    ctx.backend.revoke_tokens();

    let resp = ctx.get("/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));

    let resp = ctx.get("/login").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Session expired. Please login again.")
    );

    // The session itself is gone, not just the page that failed.
    ctx.backend.clear();
    let resp = ctx.get("/categories/c1").await;
    assert_eq!(location(&resp), Some("/login"));
    assert!(ctx.backend.requests().is_empty());
}

#[tokio::test]
async fn test_expired_token_during_htmx_request_redirects_page() {
    let ctx = TestContext::new().await;
    ctx.sign_in(PRODUCT_MANAGER).await;
    assert_eq!(ctx.get("/products/discount").await.status(), StatusCode::OK);

    ctx.backend.revoke_tokens();

    let resp = ctx.htmx_get("/products/discount/search?q=lamp").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["hx-redirect"], "/login");

    let resp = ctx.get("/products/discount").await;
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
async fn test_expired_token_during_media_cleanup_signs_operator_out() {
    let ctx = TestContext::new().await;
    ctx.sign_in(SUPER_ADMIN).await;
    ctx.backend.expire_on_asset_removal();

    let resp = ctx
        .post("/banners/b1/delete", &[("image", "banners/hero.png")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));

    assert_eq!(
        ctx.backend.requests_to(&Method::DELETE, "/banners/b1").len(),
        1
    );
    let removals = ctx.backend.requests_to(&Method::DELETE, "/asset");
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].body["public_ids"][0], "banners/hero.png");

    let resp = ctx.get("/").await;
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
async fn test_media_cleanup_keeps_session_when_it_succeeds() {
    let ctx = TestContext::new().await;
    ctx.sign_in(SUPER_ADMIN).await;

    let resp = ctx
        .post("/banners/b1/delete", &[("image", "banners/hero.png")])
        .await;
    assert_eq!(location(&resp), Some("/banners"));
    assert_eq!(ctx.backend.requests_to(&Method::DELETE, "/asset").len(), 1);
    assert_eq!(ctx.get("/").await.status(), StatusCode::OK);
}
