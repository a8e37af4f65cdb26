use crate::entities::profiles;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i64,
    pub subscription_id: i64,
    pub user_id: i64,
    pub is_active: bool,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<profiles::Model> for ProfileResponse {
    fn from(profile: profiles::Model) -> Self {
        Self {
            id: profile.id,
            subscription_id: profile.subscription_id,
            user_id: profile.user_id,
            is_active: profile.is_active,
            ended_at: profile.ended_at,
            created_at: profile.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    pub subscription_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub is_active: Option<bool>,
    pub ended_at: Option<DateTime<Utc>>,
}
