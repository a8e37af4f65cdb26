use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use subsplit_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{CacheClient, NotificationQueue},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = Arc::new(
        create_pool(&config.database)
            .await
            .expect("Failed to create database connection pool"),
    );

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // external handles; both degrade gracefully without Redis except the
    // queue, whose enqueue failures surface to callers
    let cache = CacheClient::connect(config.redis.url.as_deref())
        .expect("Failed to initialize cache client");
    let queue = NotificationQueue::connect(config.redis.url.as_deref())
        .expect("Failed to initialize notification queue");

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone(), queue.clone());
    let user_service = UserService::new(pool.clone());
    let catalog_service = CatalogService::new(pool.clone(), cache.clone());
    let subscription_service = SubscriptionService::new(pool.clone());
    let profile_service = ProfileService::new(pool.clone());
    let statement_service = StatementService::new(pool.clone(), queue.clone());
    let payment_service = PaymentService::new(pool.clone(), queue.clone());
    let dashboard_service = DashboardService::new(pool.clone());

    // a fresh deployment needs an account that can log in
    user_service
        .ensure_admin(&config.admin)
        .await
        .expect("Failed to ensure bootstrap administrator");

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(subscription_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .app_data(web::Data::new(statement_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(dashboard_service.clone()))
            .app_data(web::Data::new(cache.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::dashboard_config)
                    .configure(handlers::service_config)
                    .configure(handlers::subscription_config)
                    .configure(handlers::profile_config)
                    .configure(handlers::statement_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
