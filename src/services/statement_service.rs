use std::sync::Arc;
use crate::entities::{
    profile_entity as profiles, service_entity as services,
    statement_entity as statements, statement_item_entity as statement_items,
    subscription_entity as subscriptions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::external::{EmailJob, NotificationQueue};
use crate::models::*;
use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct StatementService {
    pool: Arc<DatabaseConnection>,
    queue: NotificationQueue,
}

impl StatementService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>, queue: NotificationQueue) -> Self {
        let pool = pool.into();
        Self { pool, queue }
    }

    /// Run statement generation for the current UTC month.
    pub async fn generate_for_current_month(&self) -> AppResult<GenerateStatementsResponse> {
        let now = Utc::now();
        self.generate_for_month(now.month() as i32, now.year()).await
    }

    /// Generate statements for one billing period.
    ///
    /// Each active subscription's monthly cost is split evenly across its
    /// active profiles and recorded as one line item per profile. Writes
    /// are independently committed idempotent upserts — there is no
    /// wrapping transaction. A re-run for the same period overwrites item
    /// amounts and leaves manually edited statuses alone. Any write or
    /// enqueue failure aborts the run; progress already committed stays.
    pub async fn generate_for_month(
        &self,
        month: i32,
        year: i32,
    ) -> AppResult<GenerateStatementsResponse> {
        log::info!("Generating statements for {month}/{year}");

        let subs = subscriptions::Entity::find()
            .filter(subscriptions::Column::IsActive.eq(true))
            .all(&*self.pool)
            .await?;

        for sub in subs {
            let service = services::Entity::find_by_id(sub.service_id)
                .one(&*self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

            let profiles = profiles::Entity::find()
                .filter(profiles::Column::SubscriptionId.eq(sub.id))
                .filter(profiles::Column::IsActive.eq(true))
                .all(&*self.pool)
                .await?;

            // a subscription with no active seats bills nobody this period
            if profiles.is_empty() {
                continue;
            }

            let mut recipients = Vec::with_capacity(profiles.len());
            for profile in &profiles {
                let user = users::Entity::find_by_id(profile.user_id)
                    .one(&*self.pool)
                    .await?;
                recipients.push((profile.user_id, user.and_then(|u| u.email)));
            }

            let amount_per_user = service.monthly_cost / profiles.len() as f64;
            let statement = self.upsert_statement(sub.id, month, year).await?;

            for (user_id, email) in recipients {
                self.upsert_item(statement.id, user_id, amount_per_user)
                    .await?;

                if let Some(email) = email {
                    self.queue
                        .add(
                            "monthly-statement",
                            EmailJob {
                                to: email,
                                subject: format!("Statement {month}/{year}"),
                                html: format!(
                                    "<p>Your charge for {}: ${:.2}</p>",
                                    service.name, amount_per_user
                                ),
                            },
                        )
                        .await?;
                }
            }
        }

        Ok(GenerateStatementsResponse { ok: true })
    }

    /// Statement keyed by (subscription, month, year): insert when absent,
    /// otherwise return the existing row untouched.
    async fn upsert_statement(
        &self,
        subscription_id: i64,
        month: i32,
        year: i32,
    ) -> AppResult<statements::Model> {
        let existing = statements::Entity::find()
            .filter(statements::Column::SubscriptionId.eq(subscription_id))
            .filter(statements::Column::Month.eq(month))
            .filter(statements::Column::Year.eq(year))
            .one(&*self.pool)
            .await?;

        if let Some(statement) = existing {
            return Ok(statement);
        }

        let statement = statements::ActiveModel {
            subscription_id: Set(subscription_id),
            month: Set(month),
            year: Set(year),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        Ok(statement)
    }

    /// Line item keyed by (statement, user): insert as PENDING when
    /// absent, otherwise overwrite the amount and leave the status alone.
    async fn upsert_item(
        &self,
        statement_id: i64,
        user_id: i64,
        amount_due: f64,
    ) -> AppResult<statement_items::Model> {
        let existing = statement_items::Entity::find()
            .filter(statement_items::Column::StatementId.eq(statement_id))
            .filter(statement_items::Column::UserId.eq(user_id))
            .one(&*self.pool)
            .await?;

        if let Some(item) = existing {
            let mut model = item.into_active_model();
            model.amount_due = Set(amount_due);
            model.updated_at = Set(Utc::now());
            let item = model.update(&*self.pool).await?;
            return Ok(item);
        }

        let now = Utc::now();
        let item = statement_items::ActiveModel {
            statement_id: Set(statement_id),
            user_id: Set(user_id),
            amount_due: Set(amount_due),
            status: Set(ItemStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        Ok(item)
    }

    /// Statements with their nested line items. Without paging parameters
    /// the full table is returned; with them the result is ordered most
    /// recent period first.
    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<StatementResponse>> {
        if !params.is_paged() {
            let rows = statements::Entity::find()
                .find_with_related(statement_items::Entity)
                .all(&*self.pool)
                .await?;
            let data: Vec<StatementResponse> = rows
                .into_iter()
                .map(|(statement, items)| StatementResponse::from_parts(statement, items))
                .collect();
            let total = data.len() as u64;
            return Ok(PaginatedResponse::new(data, 1, total.max(1), total));
        }

        let total = statements::Entity::find().count(&*self.pool).await?;

        let page = statements::Entity::find()
            .order_by(statements::Column::Year, Order::Desc)
            .order_by(statements::Column::Month, Order::Desc)
            .limit(params.page_size())
            .offset(params.offset())
            .all(&*self.pool)
            .await?;

        let statement_ids: Vec<i64> = page.iter().map(|s| s.id).collect();
        let items = statement_items::Entity::find()
            .filter(statement_items::Column::StatementId.is_in(statement_ids))
            .all(&*self.pool)
            .await?;

        let mut grouped: HashMap<i64, Vec<statement_items::Model>> = HashMap::new();
        for item in items {
            grouped.entry(item.statement_id).or_default().push(item);
        }

        let data: Vec<StatementResponse> = page
            .into_iter()
            .map(|statement| {
                let items = grouped.remove(&statement.id).unwrap_or_default();
                StatementResponse::from_parts(statement, items)
            })
            .collect();

        Ok(PaginatedResponse::new(
            data,
            params.page(),
            params.page_size(),
            total,
        ))
    }

    /// Administrator edit of one line item: amount and/or status.
    pub async fn update_item(
        &self,
        item_id: i64,
        request: UpdateStatementItemRequest,
    ) -> AppResult<StatementItemResponse> {
        if request.amount_due.is_none() && request.status.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }
        if let Some(amount) = request.amount_due {
            if amount < 0.0 {
                return Err(AppError::ValidationError(
                    "Amount due must not be negative".to_string(),
                ));
            }
        }

        let item = statement_items::Entity::find_by_id(item_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Statement item not found".to_string()))?;

        let mut model = item.into_active_model();
        if let Some(amount) = request.amount_due {
            model.amount_due = Set(amount);
        }
        if let Some(status) = request.status {
            model.status = Set(status);
        }
        model.updated_at = Set(Utc::now());

        let item = model.update(&*self.pool).await?;
        Ok(StatementItemResponse::from(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn subscription(id: i64, service_id: i64) -> subscriptions::Model {
        subscriptions::Model {
            id,
            service_id,
            owner_id: 1,
            start_date: ts(),
            end_date: None,
            is_active: true,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn service(id: i64, name: &str, monthly_cost: f64) -> services::Model {
        services::Model {
            id,
            name: name.to_string(),
            monthly_cost,
            max_profiles: 5,
            is_active: true,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn profile(id: i64, subscription_id: i64, user_id: i64) -> profiles::Model {
        profiles::Model {
            id,
            subscription_id,
            user_id,
            is_active: true,
            ended_at: None,
            created_at: ts(),
            updated_at: ts(),
        }
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

    fn statement(id: i64, subscription_id: i64) -> statements::Model {
        statements::Model {
            id,
            subscription_id,
            month: 6,
            year: 2025,
            created_at: ts(),
        }
    }

    fn item(id: i64, statement_id: i64, user_id: i64, amount_due: f64) -> statement_items::Model {
        statement_items::Model {
            id,
            statement_id,
            user_id,
            amount_due,
            status: ItemStatus::Pending,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn exec_results(n: usize) -> Vec<MockExecResult> {
        (0..n)
            .map(|i| MockExecResult {
                last_insert_id: i as u64 + 1,
                rows_affected: 1,
            })
            .collect()
    }

    fn service_under_test(db: DatabaseConnection) -> (StatementService, NotificationQueue) {
        let queue = NotificationQueue::memory();
        (StatementService::new(db, queue.clone()), queue)
    }

    #[tokio::test]
    async fn test_generation_splits_cost_evenly() {
        // one subscription, cost 100, four active profiles -> 25 each;
        // user 4 has no email and must not be notified
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![subscription(1, 10)]])
            .append_query_results([vec![service(10, "Test", 100.0)]])
            .append_query_results([vec![
                profile(1, 1, 1),
                profile(2, 1, 2),
                profile(3, 1, 3),
                profile(4, 1, 4),
            ]])
            .append_query_results([
                vec![user(1, Some("u1@example.com"))],
                vec![user(2, Some("u2@example.com"))],
                vec![user(3, Some("u3@example.com"))],
                vec![user(4, None)],
            ])
            .append_query_results([Vec::<statements::Model>::new(), vec![statement(50, 1)]])
            .append_query_results([
                Vec::<statement_items::Model>::new(),
                vec![item(100, 50, 1, 25.0)],
                Vec::new(),
                vec![item(101, 50, 2, 25.0)],
                Vec::new(),
                vec![item(102, 50, 3, 25.0)],
                Vec::new(),
                vec![item(103, 50, 4, 25.0)],
            ])
            .append_exec_results(exec_results(5))
            .into_connection();

        let (service, queue) = service_under_test(db);
        let result = service.generate_for_month(6, 2025).await.unwrap();
        assert!(result.ok);

        let jobs = queue.memory_jobs().await;
        assert_eq!(jobs.len(), 3);
        for job in &jobs {
            assert_eq!(job.name, "monthly-statement");
            assert_eq!(job.data.subject, "Statement 6/2025");
            assert!(job.data.html.contains("$25.00"));
        }
        assert_eq!(jobs[0].data.to, "u1@example.com");
    }

    #[tokio::test]
    async fn test_rerun_updates_amounts_without_new_rows() {
        // statement and item already exist: the re-run must update the
        // item amount and insert nothing (the mock has no insert results
        // to hand out, so an insert would fail the test)
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![subscription(1, 10)]])
            .append_query_results([vec![service(10, "Test", 120.0)]])
            .append_query_results([vec![profile(1, 1, 1)]])
            .append_query_results([vec![user(1, Some("u1@example.com"))]])
            .append_query_results([vec![statement(50, 1)]])
            .append_query_results([vec![item(100, 50, 1, 60.0)], vec![item(100, 50, 1, 120.0)]])
            .append_exec_results(exec_results(1))
            .into_connection();

        let (service, queue) = service_under_test(db);
        let result = service.generate_for_month(6, 2025).await.unwrap();
        assert!(result.ok);

        // the notification is sent again on every run
        let jobs = queue.memory_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].data.html.contains("$120.00"));
    }

    #[tokio::test]
    async fn test_zero_active_profiles_skips_subscription() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![subscription(1, 10)]])
            .append_query_results([vec![service(10, "Test", 100.0)]])
            .append_query_results([Vec::<profiles::Model>::new()])
            .into_connection();

        let (service, queue) = service_under_test(db);
        let result = service.generate_for_month(6, 2025).await.unwrap();
        assert!(result.ok);
        assert!(queue.memory_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_uneven_split_rounds_only_in_display() {
        // 229.00 over three profiles: stored amount keeps the full float,
        // the email shows two decimals
        let per_user = 229.0 / 3.0;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![subscription(1, 10)]])
            .append_query_results([vec![service(10, "Netflix", 229.0)]])
            .append_query_results([vec![profile(1, 1, 1), profile(2, 1, 2), profile(3, 1, 3)]])
            .append_query_results([
                vec![user(1, Some("u1@example.com"))],
                vec![user(2, Some("u2@example.com"))],
                vec![user(3, Some("u3@example.com"))],
            ])
            .append_query_results([Vec::<statements::Model>::new(), vec![statement(50, 1)]])
            .append_query_results([
                Vec::<statement_items::Model>::new(),
                vec![item(100, 50, 1, per_user)],
                Vec::new(),
                vec![item(101, 50, 2, per_user)],
                Vec::new(),
                vec![item(102, 50, 3, per_user)],
            ])
            .append_exec_results(exec_results(4))
            .into_connection();

        let (service, queue) = service_under_test(db);
        service.generate_for_month(6, 2025).await.unwrap();

        let jobs = queue.memory_jobs().await;
        assert_eq!(jobs.len(), 3);
        assert!(jobs[0].data.html.contains("Netflix"));
        assert!(jobs[0].data.html.contains("$76.33"));
    }

    #[tokio::test]
    async fn test_update_item_requires_some_field() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let (service, _) = service_under_test(db);

        let err = service
            .update_item(
                1,
                UpdateStatementItemRequest {
                    amount_due: None,
                    status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_item_sets_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item(100, 50, 1, 25.0)]])
            .append_query_results([vec![statement_items::Model {
                status: ItemStatus::Paid,
                ..item(100, 50, 1, 25.0)
            }]])
            .append_exec_results(exec_results(1))
            .into_connection();

        let (service, _) = service_under_test(db);
        let updated = service
            .update_item(
                100,
                UpdateStatementItemRequest {
                    amount_due: None,
                    status: Some(ItemStatus::Paid),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ItemStatus::Paid);
    }
}
