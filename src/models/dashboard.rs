use crate::models::{BalanceResponse, PaymentResponse, UserResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A subscription the caller participates in through an active profile.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MySubscription {
    pub id: i64,
    pub service: String,
    pub monthly_cost: f64,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminOverview {
    pub users_count: u64,
    pub services_count: u64,
    pub subscriptions_count: u64,
    pub statements_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub me: UserResponse,
    pub balance: BalanceResponse,
    pub my_subscriptions: Vec<MySubscription>,
    pub recent_payments: Vec<PaymentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_overview: Option<AdminOverview>,
}
