// GET /version

use axum::response::IntoResponse;

/// Package version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
const NAME: &str = env!("CARGO_PKG_NAME");

/// GET /version - returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
