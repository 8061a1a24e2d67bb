use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};

use stockroom_core::ProductId;
use stockroom_infra::Command;

use crate::app::dto;
use crate::app::errors;
use crate::app::routes::common::{parse_id, respond};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/import", post(import_products))
        .route("/:id", get(get_product).patch(update_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    respond(&services, &principal, StatusCode::OK, Command::ListProducts).await
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    respond(&services, &principal, StatusCode::CREATED, body.into()).await
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    respond(&services, &principal, StatusCode::OK, Command::GetProduct(id)).await
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let id: ProductId = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    respond(&services, &principal, StatusCode::OK, body.into_command(id)).await
}

/// Body is the CSV sheet itself; the response is the import report.
pub async fn import_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: String,
) -> axum::response::Response {
    respond(&services, &principal, StatusCode::OK, Command::ImportProducts(body)).await
}
