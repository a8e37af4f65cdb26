use crate::entities::services;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceResponse {
    pub id: i64,
    pub name: String,
    pub monthly_cost: f64,
    pub max_profiles: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<services::Model> for ServiceResponse {
    fn from(service: services::Model) -> Self {
        Self {
            id: service.id,
            name: service.name,
            monthly_cost: service.monthly_cost,
            max_profiles: service.max_profiles,
            is_active: service.is_active,
            created_at: service.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    #[schema(example = "Netflix")]
    pub name: String,
    #[schema(example = 229.0)]
    pub monthly_cost: f64,
    #[schema(example = 5)]
    pub max_profiles: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub monthly_cost: Option<f64>,
    pub max_profiles: Option<i32>,
    pub is_active: Option<bool>,
}
