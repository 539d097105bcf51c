//! Database-backed tests for the schema both servers share.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - Migrations applied (cargo run -p liher-cli -- migrate)
//!
//! Writes happen inside transactions that are rolled back, so the tests
//! leave no rows behind.
//!
//! Run with: cargo test -p liher-integration-tests -- --ignored

use liher_integration_tests::test_pool;
use uuid::Uuid;

// =============================================================================
// Schema Shape
// =============================================================================

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_expected_tables_exist() {
    let pool = test_pool().await;

    for table in [
        "usuarios",
        "permisos_usuarios_admin",
        "categoria",
        "color",
        "talla",
        "producto",
        "variante_producto",
        "carrito",
        "item_carrito",
        "identificacion",
        "envio",
        "pedidos",
        "item_pedido",
        "peticiones_producto",
        "entrada_inventario",
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .expect("Failed to query information_schema");

        assert!(exists, "Missing table: {table}");
    }
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_session_table_lives_in_its_own_schema() {
    let pool = test_pool().await;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'tower_sessions' AND table_name = 'session'
        )",
    )
    .fetch_one(&pool)
    .await
    .expect("Failed to query information_schema");

    assert!(exists, "Missing tower_sessions.session table");
}

// =============================================================================
// Constraints
// =============================================================================

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_user_email_is_unique() {
    let pool = test_pool().await;
    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    let email = format!("prueba-{}@liherfashion.co", Uuid::new_v4());
    let insert = "INSERT INTO usuarios (email, password_hash) VALUES ($1, 'x')";

    sqlx::query(insert)
        .bind(&email)
        .execute(&mut *tx)
        .await
        .expect("First insert should succeed");

    let err = sqlx::query(insert)
        .bind(&email)
        .execute(&mut *tx)
        .await
        .expect_err("Second insert should hit the unique constraint");

    assert!(
        err.as_database_error().is_some_and(|db| db.is_unique_violation()),
        "Expected a unique violation, got: {err}"
    );

    tx.rollback().await.expect("Failed to roll back");
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_variant_stock_cannot_go_negative() {
    let pool = test_pool().await;
    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    let suffix = Uuid::new_v4().simple().to_string();
    let reference = format!("T-{}", &suffix[..8]);

    let product_id: i32 = sqlx::query_scalar(
        "INSERT INTO producto (nombre, referencia, precio) VALUES ('Prueba', $1, 10000)
         RETURNING id",
    )
    .bind(&reference)
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to insert product");

    let size_id: i32 = sqlx::query_scalar(
        "INSERT INTO talla (nombre) VALUES ($1) RETURNING id",
    )
    .bind(format!("t-{}", &suffix[..8]))
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to insert size");

    let color_id: i32 = sqlx::query_scalar(
        "INSERT INTO color (nombre) VALUES ($1) RETURNING id",
    )
    .bind(format!("c-{}", &suffix[..8]))
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to insert color");

    let err = sqlx::query(
        "INSERT INTO variante_producto (producto_id, talla_id, color_id, stock)
         VALUES ($1, $2, $3, -1)",
    )
    .bind(product_id)
    .bind(size_id)
    .bind(color_id)
    .execute(&mut *tx)
    .await
    .expect_err("Negative stock should hit the check constraint");

    assert!(
        err.as_database_error().is_some_and(|db| db.is_check_violation()),
        "Expected a check violation, got: {err}"
    );

    tx.rollback().await.expect("Failed to roll back");
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_one_variant_per_product_size_color() {
    let pool = test_pool().await;
    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    let suffix = Uuid::new_v4().simple().to_string();
    let reference = format!("T-{}", &suffix[..8]);

    let product_id: i32 = sqlx::query_scalar(
        "INSERT INTO producto (nombre, referencia, precio) VALUES ('Prueba', $1, 10000)
         RETURNING id",
    )
    .bind(&reference)
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to insert product");

    let size_id: i32 = sqlx::query_scalar(
        "INSERT INTO talla (nombre) VALUES ($1) RETURNING id",
    )
    .bind(format!("t-{}", &suffix[..8]))
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to insert size");

    let color_id: i32 = sqlx::query_scalar(
        "INSERT INTO color (nombre) VALUES ($1) RETURNING id",
    )
    .bind(format!("c-{}", &suffix[..8]))
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to insert color");

    let insert = "INSERT INTO variante_producto (producto_id, talla_id, color_id, stock)
                  VALUES ($1, $2, $3, 1)";

    sqlx::query(insert)
        .bind(product_id)
        .bind(size_id)
        .bind(color_id)
        .execute(&mut *tx)
        .await
        .expect("First variant should succeed");

    let err = sqlx::query(insert)
        .bind(product_id)
        .bind(size_id)
        .bind(color_id)
        .execute(&mut *tx)
        .await
        .expect_err("Duplicate variant should hit the unique constraint");

    assert!(
        err.as_database_error().is_some_and(|db| db.is_unique_violation()),
        "Expected a unique violation, got: {err}"
    );

    tx.rollback().await.expect("Failed to roll back");
}
