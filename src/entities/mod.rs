pub mod password_reset_tokens;
pub mod payments;
pub mod profiles;
pub mod services;
pub mod statement_items;
pub mod statements;
pub mod subscriptions;
pub mod users;

pub use password_reset_tokens as password_reset_token_entity;
pub use payments as payment_entity;
pub use profiles as profile_entity;
pub use services as service_entity;
pub use statement_items as statement_item_entity;
pub use statements as statement_entity;
pub use subscriptions as subscription_entity;
pub use users as user_entity;
