use std::sync::Arc;
use crate::entities::service_entity as services;
use crate::error::{AppError, AppResult};
use crate::external::CacheClient;
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

const ACTIVE_SERVICES_KEY: &str = "services:active";
const CACHE_TTL_SECS: u64 = 60;

/// Catalog of shareable services (Netflix, Spotify, ...).
#[derive(Clone)]
pub struct CatalogService {
    pool: Arc<DatabaseConnection>,
    cache: CacheClient,
}

impl CatalogService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>, cache: CacheClient) -> Self {
        let pool = pool.into();
        Self { pool, cache }
    }

    /// All active services, cached for a minute. Stale entries simply age
    /// out; writes do not invalidate.
    pub async fn list_active(&self) -> AppResult<Vec<ServiceResponse>> {
        if let Some(cached) = self.cache.get(ACTIVE_SERVICES_KEY).await? {
            return Ok(serde_json::from_str(&cached)?);
        }

        let rows = services::Entity::find()
            .filter(services::Column::IsActive.eq(true))
            .all(&*self.pool)
            .await?;
        let data: Vec<ServiceResponse> = rows.into_iter().map(ServiceResponse::from).collect();

        self.cache
            .set_ex(
                ACTIVE_SERVICES_KEY,
                &serde_json::to_string(&data)?,
                CACHE_TTL_SECS,
            )
            .await?;
        Ok(data)
    }

    /// Paged/searchable view over active services, cached per query shape.
    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ServiceResponse>> {
        let q = params.search().unwrap_or_default();
        let sort = params.sort_or("name");
        let dir = if params.is_ascending(true) { "asc" } else { "desc" };
        let cache_key = format!(
            "services:active:q:{q}:p:{}:s:{}:sort:{sort}:dir:{dir}",
            params.page(),
            params.page_size()
        );

        if let Some(cached) = self.cache.get(&cache_key).await? {
            return Ok(serde_json::from_str(&cached)?);
        }

        let mut query = services::Entity::find().filter(services::Column::IsActive.eq(true));
        if !q.is_empty() {
            query = query.filter(services::Column::Name.contains(&q));
        }

        let column = match sort {
            "monthly_cost" => services::Column::MonthlyCost,
            "max_profiles" => services::Column::MaxProfiles,
            "is_active" => services::Column::IsActive,
            _ => services::Column::Name,
        };
        let order = if params.is_ascending(true) {
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

        let data: Vec<ServiceResponse> = rows.into_iter().map(ServiceResponse::from).collect();
        let response = PaginatedResponse::new(data, params.page(), params.page_size(), total);

        self.cache
            .set_ex(&cache_key, &serde_json::to_string(&response)?, CACHE_TTL_SECS)
            .await?;
        Ok(response)
    }

    pub async fn create(&self, request: CreateServiceRequest) -> AppResult<ServiceResponse> {
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError("Name must not be empty".to_string()));
        }
        if request.monthly_cost <= 0.0 {
            return Err(AppError::ValidationError(
                "Monthly cost must be positive".to_string(),
            ));
        }
        if request.max_profiles < 1 {
            return Err(AppError::ValidationError(
                "Max profiles must be at least 1".to_string(),
            ));
        }

        let now = Utc::now();
        let service = services::ActiveModel {
            name: Set(request.name.trim().to_string()),
            monthly_cost: Set(request.monthly_cost),
            max_profiles: Set(request.max_profiles),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        Ok(ServiceResponse::from(service))
    }

    pub async fn update(
        &self,
        service_id: i64,
        request: UpdateServiceRequest,
    ) -> AppResult<ServiceResponse> {
        if let Some(cost) = request.monthly_cost {
            if cost <= 0.0 {
                return Err(AppError::ValidationError(
                    "Monthly cost must be positive".to_string(),
                ));
            }
        }
        if let Some(max) = request.max_profiles {
            if max < 1 {
                return Err(AppError::ValidationError(
                    "Max profiles must be at least 1".to_string(),
                ));
            }
        }

        let service = services::Entity::find_by_id(service_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

        let mut model = service.into_active_model();
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(cost) = request.monthly_cost {
            model.monthly_cost = Set(cost);
        }
        if let Some(max) = request.max_profiles {
            model.max_profiles = Set(max);
        }
        if let Some(active) = request.is_active {
            model.is_active = Set(active);
        }
        model.updated_at = Set(Utc::now());

        let service = model.update(&*self.pool).await?;
        Ok(ServiceResponse::from(service))
    }

    pub async fn delete(&self, service_id: i64) -> AppResult<()> {
        let result = services::Entity::delete_by_id(service_id)
            .exec(&*self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Service not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service_row(id: i64, name: &str) -> services::Model {
        services::Model {
            id,
            name: name.to_string(),
            monthly_cost: 99.0,
            max_profiles: 6,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_list_active_is_served_from_cache() {
        // the mock holds a single result set; the second call must not
        // reach the database
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![service_row(1, "Spotify")]])
            .into_connection();
        let catalog = CatalogService::new(db, CacheClient::memory());

        let first = catalog.list_active().await.unwrap();
        let second = catalog.list_active().await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Spotify");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let catalog = CatalogService::new(db, CacheClient::memory());

        let err = catalog
            .create(CreateServiceRequest {
                name: "  ".to_string(),
                monthly_cost: 99.0,
                max_profiles: 5,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = catalog
            .create(CreateServiceRequest {
                name: "Netflix".to_string(),
                monthly_cost: -1.0,
                max_profiles: 5,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = catalog
            .create(CreateServiceRequest {
                name: "Netflix".to_string(),
                monthly_cost: 229.0,
                max_profiles: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
