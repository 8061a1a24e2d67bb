use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};

use stockroom_infra::Command;
use stockroom_inventory::MovementFilter;

use crate::app::dto;
use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_movements).post(record_movement))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<dto::MovementQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let filter = match MovementFilter::try_from(query) {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(&services, &principal, StatusCode::OK, Command::ListMovements(filter)).await
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::RecordMovementRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let cmd = match Command::try_from(body) {
        Ok(cmd) => cmd,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(&services, &principal, StatusCode::CREATED, cmd).await
}
