use std::sync::Arc;
use crate::entities::{payment_entity as payments, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::{EmailJob, NotificationQueue};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

#[derive(Clone)]
pub struct PaymentService {
    pool: Arc<DatabaseConnection>,
    queue: NotificationQueue,
}

impl PaymentService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>, queue: NotificationQueue) -> Self {
        let pool = pool.into();
        Self { pool, queue }
    }

    /// Record a manual payment and send the user a receipt when they have
    /// an email. Payments are standalone rows; they are never linked to
    /// statement items.
    pub async fn create(&self, request: CreatePaymentRequest) -> AppResult<PaymentResponse> {
        if request.amount <= 0.0 {
            return Err(AppError::ValidationError(
                "Amount must be positive".to_string(),
            ));
        }
        if request.method.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Method must not be empty".to_string(),
            ));
        }

        let user = users::Entity::find_by_id(request.user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let now = Utc::now();
        let payment = payments::ActiveModel {
            user_id: Set(request.user_id),
            amount: Set(request.amount),
            method: Set(request.method.trim().to_string()),
            notes: Set(request.notes),
            paid_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        if let Some(email) = user.email {
            self.queue
                .add(
                    "payment-receipt",
                    EmailJob {
                        to: email,
                        subject: "Payment confirmation".to_string(),
                        html: format!("<p>Payment received: ${:.2}</p>", payment.amount),
                    },
                )
                .await?;
        }

        Ok(PaymentResponse::from(payment))
    }

    /// Paged list; the search term matches method, notes or user email.
    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PaymentResponse>> {
        let mut query = payments::Entity::find();

        if let Some(q) = params.search() {
            query = query
                .join(JoinType::InnerJoin, payments::Relation::User.def())
                .filter(
                    Condition::any()
                        .add(payments::Column::Method.contains(&q))
                        .add(payments::Column::Notes.contains(&q))
                        .add(users::Column::Email.contains(&q)),
                );
        }

        let column = match params.sort_or("paid_at") {
            "amount" => payments::Column::Amount,
            "method" => payments::Column::Method,
            _ => payments::Column::PaidAt,
        };
        let order = if params.is_ascending(false) {
            Order::Asc
        } else {
            Order::Desc
        };

        let total = query.clone().count(&*self.pool).await?;
        let rows = query
            .order_by(column, order)
            .limit(params.page_size())
            .offset(params.offset())
            .all(&*self.pool)
            .await?;

        let data: Vec<PaymentResponse> = rows.into_iter().map(PaymentResponse::from).collect();
        Ok(PaginatedResponse::new(
            data,
            params.page(),
            params.page_size(),
            total,
        ))
    }

    pub async fn update(
        &self,
        payment_id: i64,
        request: UpdatePaymentRequest,
    ) -> AppResult<PaymentResponse> {
        if let Some(amount) = request.amount {
            if amount <= 0.0 {
                return Err(AppError::ValidationError(
                    "Amount must be positive".to_string(),
                ));
            }
        }

        let payment = payments::Entity::find_by_id(payment_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let mut model = payment.into_active_model();
        if let Some(amount) = request.amount {
            model.amount = Set(amount);
        }
        if let Some(method) = request.method {
            model.method = Set(method);
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }

        let payment = model.update(&*self.pool).await?;
        Ok(PaymentResponse::from(payment))
    }

    pub async fn delete(&self, payment_id: i64) -> AppResult<()> {
        let result = payments::Entity::delete_by_id(payment_id)
            .exec(&*self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Payment not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn user(id: i64, email: Option<&str>) -> users::Model {
        users::Model {
            id,
            email: email.map(str::to_string),
            name: format!("user-{id}"),
            role: UserRole::User,
            password_hash: "hash".to_string(),
            must_change_password: false,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn payment(id: i64, user_id: i64, amount: f64) -> payments::Model {
        payments::Model {
            id,
            user_id,
            amount,
            method: "transfer".to_string(),
            notes: None,
            paid_at: ts(),
            created_at: ts(),
        }
    }

    #[tokio::test]
    async fn test_create_sends_receipt() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("u1@example.com"))]])
            .append_query_results([vec![payment(10, 1, 50.0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 10,
                rows_affected: 1,
            }])
            .into_connection();

        let queue = NotificationQueue::memory();
        let service = PaymentService::new(db, queue.clone());
        let created = service
            .create(CreatePaymentRequest {
                user_id: 1,
                amount: 50.0,
                method: "transfer".to_string(),
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(created.amount, 50.0);
        let jobs = queue.memory_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "payment-receipt");
        assert!(jobs[0].data.html.contains("$50.00"));
    }

    #[tokio::test]
    async fn test_create_without_email_sends_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, None)]])
            .append_query_results([vec![payment(10, 1, 25.0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 10,
                rows_affected: 1,
            }])
            .into_connection();

        let queue = NotificationQueue::memory();
        let service = PaymentService::new(db, queue.clone());
        service
            .create(CreatePaymentRequest {
                user_id: 1,
                amount: 25.0,
                method: "cash".to_string(),
                notes: None,
            })
            .await
            .unwrap();

        assert!(queue.memory_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_nonpositive_amount() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = PaymentService::new(db, NotificationQueue::memory());

        let err = service
            .create(CreatePaymentRequest {
                user_id: 1,
                amount: 0.0,
                method: "cash".to_string(),
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
