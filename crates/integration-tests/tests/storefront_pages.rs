//! Integration tests for public storefront pages.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p liher-storefront)
//!
//! Run with: cargo test -p liher-integration-tests -- --ignored

use liher_integration_tests::{client, storefront_base_url};
use reqwest::StatusCode;

// =============================================================================
// Health and Catalog Pages
// =============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach health endpoint");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach readiness endpoint");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_home_page_renders() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/"))
        .send()
        .await
        .expect("Failed to get home page");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Liher Fashion"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_catalog_accepts_filters() {
    let client = client();
    let base_url = storefront_base_url();

    // Bare catalog
    let resp = client
        .get(format!("{base_url}/productos"))
        .send()
        .await
        .expect("Failed to get catalog");
    assert_eq!(resp.status(), StatusCode::OK);

    // Filters are exact names; every filter at once still renders
    let resp = client
        .get(format!(
            "{base_url}/productos?categoria=Vestidos&color=Negro&talla=M"
        ))
        .send()
        .await
        .expect("Failed to get filtered catalog");
    assert_eq!(resp.status(), StatusCode::OK);

    // A name matching nothing yields an empty page, not an error
    let resp = client
        .get(format!("{base_url}/productos?categoria=NoExiste"))
        .send()
        .await
        .expect("Failed to get catalog with unmatched filter");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_not_found() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/productos/999999"))
        .send()
        .await
        .expect("Failed to request product detail");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_page_renders_for_anonymous_session() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/carrito"))
        .send()
        .await
        .expect("Failed to get cart page");

    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Auth Pages and Gating
// =============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_auth_pages_render() {
    let client = client();
    let base_url = storefront_base_url();

    for path in ["/acceso", "/registro", "/restablecer-contrasena"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to get auth page");
        assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_with_bad_credentials_rerenders_with_error() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/acceso"))
        .form(&[
            ("email", "nadie@liherfashion.co"),
            ("password", "Incorrecta!9"),
        ])
        .send()
        .await
        .expect("Failed to post login");

    // Renders the form again with the error inline, keeping the email
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("nadie@liherfashion.co"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_requires_login() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/identificacion"))
        .send()
        .await
        .expect("Failed to get identification step");

    assert!(resp.status().is_redirection());
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("/acceso"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_account_area_requires_login() {
    let client = client();
    let base_url = storefront_base_url();

    for path in ["/mi-cuenta", "/mi-perfil", "/direcciones", "/mis-pedidos"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to get account page");

        assert!(resp.status().is_redirection(), "GET {path}");
        let location = resp
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(location.starts_with("/acceso"), "GET {path} -> {location}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_activation_with_garbage_token_is_rejected() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/activar/MQ/not-a-real-token"))
        .send()
        .await
        .expect("Failed to get activation link");

    // Invalid links render the dedicated error page, never a 500
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("no v&aacute;lido"));
}
