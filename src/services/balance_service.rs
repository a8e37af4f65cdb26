use std::sync::Arc;
use crate::entities::{payment_entity as payments, statement_item_entity as statement_items};
use crate::error::AppResult;
use crate::models::BalanceResponse;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

#[derive(Clone)]
pub struct BalanceService {
    pool: Arc<DatabaseConnection>,
}

#[derive(Debug, sea_orm::FromQueryResult)]
struct SumRow {
    total: Option<f64>,
}

impl BalanceService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        let pool = pool.into();
        Self { pool }
    }

    /// Net position of one user across all time.
    ///
    /// `due` sums every statement item regardless of status — an item
    /// marked PAID or CREDIT still counts. This is a plain sum, not a
    /// ledger: recording a payment without flipping the matching item
    /// leaves both sides in the totals.
    pub async fn compute_balance(&self, user_id: i64) -> AppResult<BalanceResponse> {
        let due = statement_items::Entity::find()
            .filter(statement_items::Column::UserId.eq(user_id))
            .select_only()
            .column_as(Expr::col(statement_items::Column::AmountDue).sum(), "total")
            .into_model::<SumRow>()
            .one(&*self.pool)
            .await?
            .and_then(|r| r.total)
            .unwrap_or(0.0);

        let paid = payments::Entity::find()
            .filter(payments::Column::UserId.eq(user_id))
            .select_only()
            .column_as(Expr::col(payments::Column::Amount).sum(), "total")
            .into_model::<SumRow>()
            .one(&*self.pool)
            .await?
            .and_then(|r| r.total)
            .unwrap_or(0.0);

        Ok(BalanceResponse {
            balance: paid - due,
            due,
            paid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn sum_row(total: Option<f64>) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("total", Value::Double(total))])
    }

    #[tokio::test]
    async fn test_empty_user_balances_to_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sum_row(None)], vec![sum_row(None)]])
            .into_connection();

        let balance = BalanceService::new(db).compute_balance(1).await.unwrap();
        assert_eq!(balance.due, 0.0);
        assert_eq!(balance.paid, 0.0);
        assert_eq!(balance.balance, 0.0);
    }

    #[tokio::test]
    async fn test_balance_is_paid_minus_due() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sum_row(Some(229.0))], vec![sum_row(Some(152.67))]])
            .into_connection();

        let balance = BalanceService::new(db).compute_balance(1).await.unwrap();
        assert_eq!(balance.due, 229.0);
        assert_eq!(balance.paid, 152.67);
        assert_eq!(balance.balance, balance.paid - balance.due);
        assert!(balance.balance < 0.0);
    }

    #[tokio::test]
    async fn test_credit_when_paid_exceeds_due() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sum_row(Some(76.33))], vec![sum_row(Some(100.0))]])
            .into_connection();

        let balance = BalanceService::new(db).compute_balance(1).await.unwrap();
        assert!(balance.balance > 0.0);
        assert_eq!(balance.balance, 100.0 - 76.33);
    }
}
