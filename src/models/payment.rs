use crate::entities::payments;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub method: String,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl From<payments::Model> for PaymentResponse {
    fn from(payment: payments::Model) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            amount: payment.amount,
            method: payment.method,
            notes: payment.notes,
            paid_at: payment.paid_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub user_id: i64,
    #[schema(example = 76.33)]
    pub amount: f64,
    #[schema(example = "transfer")]
    pub method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub notes: Option<String>,
}
