//! Integration tests for the cart and petición JSON endpoints.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p liher-storefront)
//!
//! They use ids far outside any seeded range, so they pass against a
//! seeded or an empty catalog alike.
//!
//! Run with: cargo test -p liher-integration-tests -- --ignored

use liher_integration_tests::{client, storefront_base_url};
use reqwest::StatusCode;
use serde_json::{Value, json};

// =============================================================================
// Cart Mutations
// =============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_add_unknown_variant_is_rejected_as_json() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/carrito/agregar/999999"))
        .json(&json!({ "cantidad": 1 }))
        .send()
        .await
        .expect("Failed to post add-to-cart");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("no existe")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_add_without_body_defaults_to_one_unit() {
    let client = client();
    let base_url = storefront_base_url();

    // No JSON body at all; the handler treats it as cantidad = 1, so an
    // unknown variant still answers with the JSON rejection shape.
    let resp = client
        .post(format!("{base_url}/carrito/agregar/999999"))
        .send()
        .await
        .expect("Failed to post add-to-cart without body");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_update_unknown_line_is_rejected_as_json() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/carrito/actualizar/999999"))
        .form(&[("cantidad", "2")])
        .send()
        .await
        .expect("Failed to post quantity update");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("carrito")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_clear_cart_always_succeeds() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/carrito/limpiar"))
        .send()
        .await
        .expect("Failed to post cart clear");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["total_items"], json!(0));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_survives_across_requests_in_one_session() {
    let client = client();
    let base_url = storefront_base_url();

    // First request creates the session cart
    let resp = client
        .post(format!("{base_url}/carrito/limpiar"))
        .send()
        .await
        .expect("Failed to post cart clear");
    assert_eq!(resp.status(), StatusCode::OK);

    // Same cookie jar, so the cart page must resolve the same cart
    let resp = client
        .get(format!("{base_url}/carrito"))
        .send()
        .await
        .expect("Failed to get cart page");
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Peticiones and Email Validation
// =============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_request_requires_login() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/peticiones/crear/1"))
        .json(&json!({ "cantidad": 1 }))
        .send()
        .await
        .expect("Failed to post product request");

    // Anonymous buyers are bounced to the login page
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
async fn test_email_validation_endpoint() {
    let client = client();
    let base_url = storefront_base_url();

    // An address nobody registered
    let resp = client
        .get(format!(
            "{base_url}/ajax/validar-email?email=nadie@liherfashion.co"
        ))
        .send()
        .await
        .expect("Failed to get email validation");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(body["exists"], json!(false));

    // Garbage input counts as not-registered rather than an error
    let resp = client
        .get(format!("{base_url}/ajax/validar-email?email=sin-arroba"))
        .send()
        .await
        .expect("Failed to get email validation");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(body["exists"], json!(false));
}
