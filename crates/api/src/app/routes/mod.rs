use axum::{Router, routing::get};

pub mod common;
pub mod dashboard;
pub mod exports;
pub mod movements;
pub mod products;
pub mod requisitions;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/dashboard", get(dashboard::summary))
        .nest("/products", products::router())
        .nest("/movements", movements::router())
        .nest("/requisitions", requisitions::router())
        .nest("/exports", exports::router())
}
