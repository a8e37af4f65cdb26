use std::sync::Arc;
use crate::entities::{
    profile_entity as profiles, service_entity as services,
    subscription_entity as subscriptions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct SubscriptionService {
    pool: Arc<DatabaseConnection>,
}

impl SubscriptionService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        let pool = pool.into();
        Self { pool }
    }

    pub async fn create(
        &self,
        request: CreateSubscriptionRequest,
    ) -> AppResult<SubscriptionResponse> {
        let service = services::Entity::find_by_id(request.service_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

        let owner = users::Entity::find_by_id(request.owner_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let now = Utc::now();
        let subscription = subscriptions::ActiveModel {
            service_id: Set(request.service_id),
            owner_id: Set(request.owner_id),
            start_date: Set(request.start_date),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        Ok(SubscriptionResponse {
            id: subscription.id,
            service: ServiceResponse::from(service),
            owner: UserResponse::from(owner),
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            is_active: subscription.is_active,
            profiles: Vec::new(),
            created_at: subscription.created_at,
        })
    }

    /// Paged list with the service, owner and profiles embedded. The
    /// search term matches the service name or the owner email.
    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<SubscriptionResponse>> {
        let mut query = subscriptions::Entity::find();

        if let Some(q) = params.search() {
            query = query
                .join(JoinType::InnerJoin, subscriptions::Relation::Service.def())
                .join(JoinType::InnerJoin, subscriptions::Relation::Owner.def())
                .filter(
                    Condition::any()
                        .add(services::Column::Name.contains(&q))
                        .add(users::Column::Email.contains(&q)),
                );
        }

        let column = match params.sort_or("start_date") {
            "end_date" => subscriptions::Column::EndDate,
            "is_active" => subscriptions::Column::IsActive,
            _ => subscriptions::Column::StartDate,
        };
        let order = if params.is_ascending(false) {
            Order::Asc
        } else {
            Order::Desc
        };

        let total = query.clone().count(&*self.pool).await?;
        let page = query
            .order_by(column, order)
            .limit(params.page_size())
            .offset(params.offset())
            .all(&*self.pool)
            .await?;

        let data = self.assemble(page).await?;
        Ok(PaginatedResponse::new(
            data,
            params.page(),
            params.page_size(),
            total,
        ))
    }

    async fn assemble(
        &self,
        page: Vec<subscriptions::Model>,
    ) -> AppResult<Vec<SubscriptionResponse>> {
        let service_ids: Vec<i64> = page.iter().map(|s| s.service_id).collect();
        let owner_ids: Vec<i64> = page.iter().map(|s| s.owner_id).collect();
        let subscription_ids: Vec<i64> = page.iter().map(|s| s.id).collect();

        let service_map: HashMap<i64, services::Model> = services::Entity::find()
            .filter(services::Column::Id.is_in(service_ids))
            .all(&*self.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let owner_map: HashMap<i64, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(owner_ids))
            .all(&*self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut profile_map: HashMap<i64, Vec<profiles::Model>> = HashMap::new();
        let profile_rows = profiles::Entity::find()
            .filter(profiles::Column::SubscriptionId.is_in(subscription_ids))
            .all(&*self.pool)
            .await?;
        for profile in profile_rows {
            profile_map
                .entry(profile.subscription_id)
                .or_default()
                .push(profile);
        }

        let mut data = Vec::with_capacity(page.len());
        for subscription in page {
            let service = service_map
                .get(&subscription.service_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;
            let owner = owner_map
                .get(&subscription.owner_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            let profile_rows = profile_map.remove(&subscription.id).unwrap_or_default();

            data.push(SubscriptionResponse {
                id: subscription.id,
                service: ServiceResponse::from(service),
                owner: UserResponse::from(owner),
                start_date: subscription.start_date,
                end_date: subscription.end_date,
                is_active: subscription.is_active,
                profiles: profile_rows.into_iter().map(ProfileResponse::from).collect(),
                created_at: subscription.created_at,
            });
        }

        Ok(data)
    }

    /// End or reactivate a subscription.
    pub async fn update(
        &self,
        subscription_id: i64,
        request: UpdateSubscriptionRequest,
    ) -> AppResult<SubscriptionResponse> {
        if request.is_active.is_none() && request.end_date.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let subscription = subscriptions::Entity::find_by_id(subscription_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

        let mut model = subscription.into_active_model();
        if let Some(active) = request.is_active {
            model.is_active = Set(active);
        }
        if let Some(end_date) = request.end_date {
            model.end_date = Set(Some(end_date));
        }
        model.updated_at = Set(Utc::now());

        let subscription = model.update(&*self.pool).await?;
        let mut assembled = self.assemble(vec![subscription]).await?;
        Ok(assembled.remove(0))
    }
}
