use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use stockroom_infra::{Command, Outcome};

use crate::app::errors;
use crate::app::routes::common::execute;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/products.csv", get(export_products))
        .route("/requisitions.csv", get(export_requisitions))
}

pub async fn export_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    download(&services, &principal, Command::ExportProducts).await
}

pub async fn export_requisitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    download(&services, &principal, Command::ExportRequisitions).await
}

async fn download(services: &AppServices, principal: &PrincipalContext, command: Command) -> axum::response::Response {
    let sheet = match execute(services, principal, command).await {
        Ok(Outcome::Sheet(sheet)) => sheet,
        Ok(_) => {
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected_outcome",
                "export did not produce a sheet",
            );
        }
        Err(res) => return res,
    };

    let csv = match sheet.to_csv() {
        Ok(csv) => csv,
        Err(e) => {
            tracing::error!(error = %e, "failed to render export");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "export_error", e.to_string());
        }
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", sheet.filename),
            ),
        ],
        csv,
    )
        .into_response()
}
