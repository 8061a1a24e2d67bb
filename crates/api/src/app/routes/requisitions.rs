use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};

use stockroom_core::RequisitionId;
use stockroom_infra::Command;

use crate::app::dto;
use crate::app::errors;
use crate::app::routes::common::{parse_id, respond};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_requisitions).post(create_requisition))
        .route("/:id", get(get_requisition))
        .route("/:id/approve", post(approve_requisition))
        .route("/:id/deny", post(deny_requisition))
}

pub async fn create_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateRequisitionRequest>, JsonRejection>,
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

pub async fn list_requisitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    respond(&services, &principal, StatusCode::OK, Command::ListRequisitions).await
}

pub async fn get_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RequisitionId = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    respond(&services, &principal, StatusCode::OK, Command::GetRequisition(id)).await
}

pub async fn approve_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RequisitionId = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    respond(&services, &principal, StatusCode::OK, Command::ApproveRequisition(id)).await
}

pub async fn deny_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RequisitionId = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    respond(&services, &principal, StatusCode::OK, Command::DenyRequisition(id)).await
}
