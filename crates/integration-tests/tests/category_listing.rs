//! Integration tests for paged category listings.

use reqwest::{Method, StatusCode};

use atelier_integration_tests::{ADMIN, PAGE_SIZE, TestContext};

const LAMP_PRODUCTS: &str = "/categories/products/c1";

#[tokio::test]
async fn test_page_fetched_once_then_cached() {
    let ctx = TestContext::new().await;
    ctx.sign_in(ADMIN).await;

    let resp = ctx.get("/categories/c1?page=2").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Lamp page 2 A"));

    let fetches = ctx.backend.requests_to(&Method::GET, LAMP_PRODUCTS);
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].param("page"), Some("2"));
    assert_eq!(fetches[0].param("limit"), Some(PAGE_SIZE.to_string().as_str()));

    let resp = ctx.get("/categories/c1?page=2").await;
    assert!(resp.text().await.unwrap().contains("Lamp page 2 B"));
    assert_eq!(ctx.backend.requests_to(&Method::GET, LAMP_PRODUCTS).len(), 1);
}

#[tokio::test]
async fn test_page_past_the_end_is_clamped() {
    let ctx = TestContext::new().await;
    ctx.sign_in(ADMIN).await;

    ctx.get("/categories/c1").await;
    let resp = ctx.get("/categories/c1?page=9").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Lamp page 3 A"));

    let pages: Vec<String> = ctx
        .backend
        .requests_to(&Method::GET, LAMP_PRODUCTS)
        .iter()
        .filter_map(|r| r.param("page").map(str::to_owned))
        .collect();
    assert_eq!(pages, ["1", "3"]);
}

#[tokio::test]
async fn test_parent_category_lists_sub_categories_only() {
    let ctx = TestContext::new().await;
    ctx.sign_in(ADMIN).await;

    let resp = ctx.get("/categories/c2").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Chairs"));
    assert!(
        ctx.backend
            .requests()
            .iter()
            .all(|r| !r.path.starts_with("/categories/products/"))
    );
}
