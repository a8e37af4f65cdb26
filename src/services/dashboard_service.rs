use std::sync::Arc;
use crate::entities::{
    payment_entity as payments, profile_entity as profiles, service_entity as services,
    statement_entity as statements, subscription_entity as subscriptions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::BalanceService;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

#[derive(Clone)]
pub struct DashboardService {
    pool: Arc<DatabaseConnection>,
    balance: BalanceService,
}

impl DashboardService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        let pool = pool.into();
        let balance = BalanceService::new(pool.clone());
        Self { pool, balance }
    }

    /// The caller's home view: profile, balance, the subscriptions they
    /// hold an active seat on, and their ten most recent payments.
    /// Administrators additionally get global counts.
    pub async fn me(&self, user_id: i64) -> AppResult<MeResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let balance = self.balance.compute_balance(user_id).await?;

        let my_profiles = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .filter(profiles::Column::IsActive.eq(true))
            .all(&*self.pool)
            .await?;

        let mut my_subscriptions = Vec::with_capacity(my_profiles.len());
        for profile in &my_profiles {
            let subscription = subscriptions::Entity::find_by_id(profile.subscription_id)
                .one(&*self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;
            let service = services::Entity::find_by_id(subscription.service_id)
                .one(&*self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

            my_subscriptions.push(MySubscription {
                id: subscription.id,
                service: service.name,
                monthly_cost: service.monthly_cost,
                start_date: subscription.start_date,
            });
        }

        let recent_payments = payments::Entity::find()
            .filter(payments::Column::UserId.eq(user_id))
            .order_by(payments::Column::PaidAt, Order::Desc)
            .limit(10)
            .all(&*self.pool)
            .await?
            .into_iter()
            .map(PaymentResponse::from)
            .collect();

        let admin_overview = if user.role == UserRole::Admin {
            Some(self.admin_overview().await?)
        } else {
            None
        };

        Ok(MeResponse {
            me: UserResponse::from(user),
            balance,
            my_subscriptions,
            recent_payments,
            admin_overview,
        })
    }

    async fn admin_overview(&self) -> AppResult<AdminOverview> {
        let users_count = users::Entity::find().count(&*self.pool).await?;
        let services_count = services::Entity::find()
            .filter(services::Column::IsActive.eq(true))
            .count(&*self.pool)
            .await?;
        let subscriptions_count = subscriptions::Entity::find()
            .filter(subscriptions::Column::IsActive.eq(true))
            .count(&*self.pool)
            .await?;
        let statements_count = statements::Entity::find().count(&*self.pool).await?;

        Ok(AdminOverview {
            users_count,
            services_count,
            subscriptions_count,
            statements_count,
        })
    }

    pub fn balance_service(&self) -> &BalanceService {
        &self.balance
    }
}
