use std::str::FromStr;

use axum::{Json, http::StatusCode, response::IntoResponse};

use stockroom_core::DomainError;
use stockroom_infra::{Command, Outcome};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Run a command for the request principal, mapping failures to responses.
pub async fn execute(
    services: &AppServices,
    principal: &PrincipalContext,
    command: Command,
) -> Result<Outcome, axum::response::Response> {
    services
        .workflow
        .execute(principal.principal(), command)
        .await
        .map_err(errors::workflow_error_to_response)
}

/// Run a command and render its outcome as JSON with `status`.
pub async fn respond(
    services: &AppServices,
    principal: &PrincipalContext,
    status: StatusCode,
    command: Command,
) -> axum::response::Response {
    match execute(services, principal, command).await {
        Ok(outcome) => (status, Json(outcome)).into_response(),
        Err(res) => res,
    }
}

pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
