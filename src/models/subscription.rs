use crate::models::{ProfileResponse, ServiceResponse, UserResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub service: ServiceResponse,
    pub owner: UserResponse,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub profiles: Vec<ProfileResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub service_id: i64,
    pub owner_id: i64,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub is_active: Option<bool>,
    pub end_date: Option<DateTime<Utc>>,
}
