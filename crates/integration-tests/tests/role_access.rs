//! Integration tests for role-gated screens.

use reqwest::{Method, StatusCode};

use atelier_integration_tests::{ADMIN, PRODUCT_MANAGER, SUPER_ADMIN, TestContext};

#[tokio::test]
async fn test_admin_accounts_visible_to_super_admin() {
    let ctx = TestContext::new().await;
    ctx.sign_in(SUPER_ADMIN).await;

    let resp = ctx.get("/admins?role=PRODUCT&search=catalog").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("catalog@atelier.test"));

    let lists = ctx.backend.requests_to(&Method::GET, "/admins");
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].param("role"), Some("PRODUCT"));
    assert_eq!(lists[0].param("search"), Some("catalog"));
}

#[tokio::test]
async fn test_admin_accounts_denied_to_other_roles() {
    for email in [ADMIN, PRODUCT_MANAGER] {
        let ctx = TestContext::new().await;
        ctx.sign_in(email).await;

        let resp = ctx.get("/admins").await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{email}");

        let resp = ctx.get("/admins/new").await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{email}");

        assert!(ctx.backend.requests_to(&Method::GET, "/admins").is_empty());
    }
}

#[tokio::test]
async fn test_product_manager_can_open_bulk_pricing() {
    let ctx = TestContext::new().await;
    ctx.sign_in(PRODUCT_MANAGER).await;

    let resp = ctx.get("/products/discount").await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Forbidden pages keep the operator signed in.
    assert_eq!(ctx.get("/admins").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.get("/").await.status(), StatusCode::OK);
}
