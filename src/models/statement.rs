use crate::entities::{statement_items, statements};
use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Line-item status. Manually curated by administrators; payments never
/// flip an item to PAID on their own.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum ItemStatus {
    #[sea_orm(string_value = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    #[serde(rename = "PAID")]
    Paid,
    #[sea_orm(string_value = "CREDIT")]
    #[serde(rename = "CREDIT")]
    Credit,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "PENDING"),
            ItemStatus::Paid => write!(f, "PAID"),
            ItemStatus::Credit => write!(f, "CREDIT"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatementItemResponse {
    pub id: i64,
    pub statement_id: i64,
    pub user_id: i64,
    pub amount_due: f64,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

impl From<statement_items::Model> for StatementItemResponse {
    fn from(item: statement_items::Model) -> Self {
        Self {
            id: item.id,
            statement_id: item.statement_id,
            user_id: item.user_id,
            amount_due: item.amount_due,
            status: item.status,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatementResponse {
    pub id: i64,
    pub subscription_id: i64,
    pub month: i32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub items: Vec<StatementItemResponse>,
}

impl StatementResponse {
    pub fn from_parts(statement: statements::Model, items: Vec<statement_items::Model>) -> Self {
        Self {
            id: statement.id,
            subscription_id: statement.subscription_id,
            month: statement.month,
            year: statement.year,
            created_at: statement.created_at,
            items: items.into_iter().map(StatementItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatementItemRequest {
    pub amount_due: Option<f64>,
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateStatementsResponse {
    pub ok: bool,
}
