use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Net position of one user: everything billed minus everything paid,
/// summed across all time. Positive balance means credit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub balance: f64,
    pub due: f64,
    pub paid: f64,
}
