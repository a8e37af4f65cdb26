use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::CatalogService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/services",
    tag = "service",
    params(
        ("q" = Option<String>, Query, description = "Search by name"),
        ("sort" = Option<String>, Query, description = "name | monthly_cost | max_profiles | is_active"),
        ("dir" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("page_size" = Option<u64>, Query, description = "Page size (max 100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Active services; paged when paging params are present"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_services(
    catalog_service: web::Data<CatalogService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let params = query.into_inner();

    // plain listing unless paging or a search term was asked for
    if !params.is_paged() && params.search().is_none() {
        return match catalog_service.list_active().await {
            Ok(response) => Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": response
            }))),
            Err(e) => Ok(e.error_response()),
        };
    }

    match catalog_service.list(&params).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/services",
    tag = "service",
    request_body = CreateServiceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Service created", body = ServiceResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_service(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    request: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match catalog_service.create(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn service_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/services")
            .route("", web::get().to(list_services))
            .route("", web::post().to(create_service)),
    );
}
