use std::sync::Arc;
use crate::entities::{
    profile_entity as profiles, service_entity as services,
    subscription_entity as subscriptions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

#[derive(Clone)]
pub struct ProfileService {
    pool: Arc<DatabaseConnection>,
}

impl ProfileService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        let pool = pool.into();
        Self { pool }
    }

    /// Add a seat to a subscription. The service's max_profiles cap is
    /// checked here, at creation time only; later edits are not
    /// re-validated against it.
    pub async fn create(&self, request: CreateProfileRequest) -> AppResult<ProfileResponse> {
        let subscription = subscriptions::Entity::find_by_id(request.subscription_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

        let service = services::Entity::find_by_id(subscription.service_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

        users::Entity::find_by_id(request.user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let active_count = profiles::Entity::find()
            .filter(profiles::Column::SubscriptionId.eq(request.subscription_id))
            .filter(profiles::Column::IsActive.eq(true))
            .count(&*self.pool)
            .await?;

        if active_count >= service.max_profiles as u64 {
            return Err(AppError::ValidationError(
                "Max profiles reached".to_string(),
            ));
        }

        let now = Utc::now();
        let profile = profiles::ActiveModel {
            subscription_id: Set(request.subscription_id),
            user_id: Set(request.user_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        Ok(ProfileResponse::from(profile))
    }

    pub async fn update(
        &self,
        profile_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<ProfileResponse> {
        if request.is_active.is_none() && request.ended_at.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let profile = profiles::Entity::find_by_id(profile_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let mut model = profile.into_active_model();
        if let Some(active) = request.is_active {
            model.is_active = Set(active);
        }
        if let Some(ended_at) = request.ended_at {
            model.ended_at = Set(Some(ended_at));
        }
        model.updated_at = Set(Utc::now());

        let profile = model.update(&*self.pool).await?;
        Ok(ProfileResponse::from(profile))
    }

    pub async fn delete(&self, profile_id: i64) -> AppResult<()> {
        let result = profiles::Entity::delete_by_id(profile_id)
            .exec(&*self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
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

    fn service(id: i64, max_profiles: i32) -> services::Model {
        services::Model {
            id,
            name: "Netflix".to_string(),
            monthly_cost: 229.0,
            max_profiles,
            is_active: true,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn user(id: i64) -> users::Model {
        users::Model {
            id,
            email: Some(format!("u{id}@example.com")),
            name: format!("user-{id}"),
            role: UserRole::User,
            password_hash: "hash".to_string(),
            must_change_password: false,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_create_rejects_full_subscription() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![subscription(1, 10)]])
            .append_query_results([vec![service(10, 5)]])
            .append_query_results([vec![user(2)]])
            .append_query_results([vec![count_row(5)]])
            .into_connection();

        let err = ProfileService::new(db)
            .create(CreateProfileRequest {
                subscription_id: 1,
                user_id: 2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_unknown_subscription_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<subscriptions::Model>::new()])
            .into_connection();

        let err = ProfileService::new(db)
            .create(CreateProfileRequest {
                subscription_id: 99,
                user_id: 2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
