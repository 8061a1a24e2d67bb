use std::sync::Arc;

use axum::{
    extract::{Extension, Query, rejection::QueryRejection},
    http::StatusCode,
};

use stockroom_infra::Command;
use stockroom_inventory::MovementFilter;

use crate::app::dto;
use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Totals and top products follow the movement filter; critical products and
/// the pending count always reflect current state.
pub async fn summary(
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
    respond(&services, &principal, StatusCode::OK, Command::Dashboard(filter)).await
}
