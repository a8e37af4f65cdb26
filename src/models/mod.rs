pub mod balance;
pub mod common;
pub mod dashboard;
pub mod pagination;
pub mod payment;
pub mod profile;
pub mod service;
pub mod statement;
pub mod subscription;
pub mod user;

pub use balance::*;
pub use common::*;
pub use dashboard::*;
pub use pagination::*;
pub use payment::*;
pub use profile::*;
pub use service::*;
pub use statement::*;
pub use subscription::*;
pub use user::*;
