use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::StatementService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/statements",
    tag = "statement",
    params(
        ("page" = Option<u64>, Query, description = "Page number; omit together with page_size for the full list"),
        ("page_size" = Option<u64>, Query, description = "Page size (max 100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Statements with nested line items"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_statements(
    statement_service: web::Data<StatementService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    match statement_service.list(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/statements/generate",
    tag = "statement",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Statements generated for the current month", body = GenerateStatementsResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn generate_statements(
    statement_service: web::Data<StatementService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match statement_service.generate_for_current_month().await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn statement_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/statements")
            .route("", web::get().to(list_statements))
            .route("/generate", web::post().to(generate_statements)),
    );
}
