use crate::error::AppError;
use crate::external::CacheClient;
use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::{
    CatalogService, PaymentService, ProfileService, StatementService, SubscriptionService,
    UserService,
};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn client_ip(req: &HttpRequest) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "local".to_string())
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("q" = Option<String>, Query, description = "Search by email or name"),
        ("sort" = Option<String>, Query, description = "created_at | email | name | role"),
        ("dir" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("page_size" = Option<u64>, Query, description = "Page size (max 100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged users"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match user_service.list(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    request_body = CreateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User created; temp password returned once", body = CreatedUserResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin only"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn create_user(
    user_service: web::Data<UserService>,
    cache: web::Data<CacheClient>,
    req: HttpRequest,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    let key = format!("create-user:{}", client_ip(&req));
    match cache.rate_limit(&key, 10, 60).await {
        Ok(true) => {}
        Ok(false) => return Ok(AppError::TooManyRequests.error_response()),
        Err(e) => return Ok(e.error_response()),
    }

    match user_service.create(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    tag = "admin",
    request_body = UpdateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User updated", body = CreatedUserResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match user_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match user_service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "ok": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/services/{id}",
    tag = "admin",
    request_body = UpdateServiceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Service updated", body = ServiceResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn update_service(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateServiceRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match catalog_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/services/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Service deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn delete_service(
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match catalog_service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "ok": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/subscriptions/{id}",
    tag = "admin",
    request_body = UpdateSubscriptionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Subscription updated", body = SubscriptionResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Subscription not found")
    )
)]
pub async fn update_subscription(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match subscription_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/profiles/{id}",
    tag = "admin",
    request_body = UpdateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_profile(
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match profile_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/profiles/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn delete_profile(
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match profile_service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "ok": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/payments/{id}",
    tag = "admin",
    request_body = UpdatePaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment updated", body = PaymentResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn update_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdatePaymentRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match payment_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/payments/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn delete_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match payment_service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "ok": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/statement-items/{id}",
    tag = "admin",
    request_body = UpdateStatementItemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Statement item updated", body = StatementItemResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Statement item not found")
    )
)]
pub async fn update_statement_item(
    statement_service: web::Data<StatementService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateStatementItemRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match statement_service
        .update_item(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users", web::get().to(list_users))
            .route("/users", web::post().to(create_user))
            .route("/users/{id}", web::patch().to(update_user))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/services/{id}", web::patch().to(update_service))
            .route("/services/{id}", web::delete().to(delete_service))
            .route("/subscriptions/{id}", web::patch().to(update_subscription))
            .route("/profiles/{id}", web::patch().to(update_profile))
            .route("/profiles/{id}", web::delete().to(delete_profile))
            .route("/payments/{id}", web::patch().to(update_payment))
            .route("/payments/{id}", web::delete().to(delete_payment))
            .route("/statement-items/{id}", web::patch().to(update_statement_item)),
    );
}
