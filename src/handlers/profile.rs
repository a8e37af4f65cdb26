use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::ProfileService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/profiles",
    tag = "profile",
    request_body = CreateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Invalid input or max profiles reached"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Subscription not found")
    )
)]
pub async fn create_profile(
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
    request: web::Json<CreateProfileRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match profile_service.create(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn profile_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/profiles").route("", web::post().to(create_profile)));
}
