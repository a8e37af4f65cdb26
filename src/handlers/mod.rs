pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod payment;
pub mod profile;
pub mod service;
pub mod statement;
pub mod subscription;

pub use admin::admin_config;
pub use auth::auth_config;
pub use dashboard::dashboard_config;
pub use payment::payment_config;
pub use profile::profile_config;
pub use service::service_config;
pub use statement::statement_config;
pub use subscription::subscription_config;
