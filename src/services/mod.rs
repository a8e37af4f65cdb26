pub mod auth_service;
pub mod balance_service;
pub mod catalog_service;
pub mod dashboard_service;
pub mod payment_service;
pub mod profile_service;
pub mod statement_service;
pub mod subscription_service;
pub mod user_service;

pub use auth_service::*;
pub use balance_service::*;
pub use catalog_service::*;
pub use dashboard_service::*;
pub use payment_service::*;
pub use profile_service::*;
pub use statement_service::*;
pub use subscription_service::*;
pub use user_service::*;
