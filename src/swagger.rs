use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::change_password,
        handlers::auth::request_reset,
        handlers::auth::reset_password,
        handlers::dashboard::me,
        handlers::dashboard::balance,
        handlers::service::list_services,
        handlers::service::create_service,
        handlers::subscription::list_subscriptions,
        handlers::subscription::create_subscription,
        handlers::profile::create_profile,
        handlers::statement::list_statements,
        handlers::statement::generate_statements,
        handlers::payment::list_payments,
        handlers::payment::create_payment,
        handlers::admin::list_users,
        handlers::admin::create_user,
        handlers::admin::update_user,
        handlers::admin::delete_user,
        handlers::admin::update_service,
        handlers::admin::delete_service,
        handlers::admin::update_subscription,
        handlers::admin::update_profile,
        handlers::admin::delete_profile,
        handlers::admin::update_payment,
        handlers::admin::delete_payment,
        handlers::admin::update_statement_item,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            CreateUserRequest,
            CreatedUserResponse,
            UpdateUserRequest,
            LoginRequest,
            AuthResponse,
            ChangePasswordRequest,
            RequestResetRequest,
            ResetPasswordRequest,
            OkResponse,
            ServiceResponse,
            CreateServiceRequest,
            UpdateServiceRequest,
            SubscriptionResponse,
            CreateSubscriptionRequest,
            UpdateSubscriptionRequest,
            ProfileResponse,
            CreateProfileRequest,
            UpdateProfileRequest,
            ItemStatus,
            StatementItemResponse,
            StatementResponse,
            UpdateStatementItemRequest,
            GenerateStatementsResponse,
            PaymentResponse,
            CreatePaymentRequest,
            UpdatePaymentRequest,
            BalanceResponse,
            MySubscription,
            AdminOverview,
            MeResponse,
            PaginationParams,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "dashboard", description = "Caller dashboard and balance API"),
        (name = "service", description = "Service catalog API"),
        (name = "subscription", description = "Subscription management API"),
        (name = "profile", description = "Profile management API"),
        (name = "statement", description = "Statement generation and listing API"),
        (name = "payment", description = "Payment API"),
        (name = "admin", description = "Administration API"),
    ),
    info(
        title = "Subsplit Backend API",
        version = "1.0.0",
        description = "Subscription-sharing billing manager REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
