use std::sync::Arc;
use crate::config::AdminConfig;
use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{generate_temp_password, hash_password, validate_email};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        let pool = pool.into();
        Self { pool }
    }

    /// Make sure the bootstrap administrator exists. Runs once at startup
    /// so a fresh deployment can be logged into.
    pub async fn ensure_admin(&self, config: &AdminConfig) -> AppResult<()> {
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(config.email.as_str()))
            .one(&*self.pool)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let now = Utc::now();
        users::ActiveModel {
            email: Set(Some(config.email.clone())),
            name: Set("Admin".to_string()),
            role: Set(UserRole::Admin),
            password_hash: Set(hash_password(&config.password)?),
            must_change_password: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        log::info!("Bootstrap administrator created: {}", config.email);
        Ok(())
    }

    /// Create a user with a generated temporary password. The password is
    /// returned exactly once and the account is flagged to change it.
    pub async fn create(&self, request: CreateUserRequest) -> AppResult<CreatedUserResponse> {
        validate_email(&request.email)?;
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError("Name must not be empty".to_string()));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.as_str()))
            .one(&*self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Email already in use".to_string(),
            ));
        }

        let temp_password = generate_temp_password();
        let now = Utc::now();
        let user = users::ActiveModel {
            email: Set(Some(request.email)),
            name: Set(request.name.trim().to_string()),
            role: Set(request.role.unwrap_or(UserRole::User)),
            password_hash: Set(hash_password(&temp_password)?),
            must_change_password: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        Ok(CreatedUserResponse {
            user: UserResponse::from(user),
            temp_password: Some(temp_password),
        })
    }

    /// Paged list; the search term matches email or name.
    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<UserResponse>> {
        let mut query = users::Entity::find();

        if let Some(q) = params.search() {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Email.contains(&q))
                    .add(users::Column::Name.contains(&q)),
            );
        }

        let column = match params.sort_or("created_at") {
            "email" => users::Column::Email,
            "name" => users::Column::Name,
            "role" => users::Column::Role,
            _ => users::Column::CreatedAt,
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

        let data: Vec<UserResponse> = rows.into_iter().map(UserResponse::from).collect();
        Ok(PaginatedResponse::new(
            data,
            params.page(),
            params.page_size(),
            total,
        ))
    }

    /// Edit name/role; with reset_password a new temporary password is
    /// generated and returned.
    pub async fn update(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> AppResult<CreatedUserResponse> {
        if request.name.is_none() && request.role.is_none() && request.reset_password.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut temp_password = None;
        let mut model = user.into_active_model();
        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(AppError::ValidationError("Name must not be empty".to_string()));
            }
            model.name = Set(name.trim().to_string());
        }
        if let Some(role) = request.role {
            model.role = Set(role);
        }
        if request.reset_password == Some(true) {
            let password = generate_temp_password();
            model.password_hash = Set(hash_password(&password)?);
            model.must_change_password = Set(true);
            temp_password = Some(password);
        }
        model.updated_at = Set(Utc::now());

        let user = model.update(&*self.pool).await?;
        Ok(CreatedUserResponse {
            user: UserResponse::from(user),
            temp_password,
        })
    }

    pub async fn delete(&self, user_id: i64) -> AppResult<()> {
        let result = users::Entity::delete_by_id(user_id).exec(&*self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_rejects_invalid_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = UserService::new(db);

        let err = service
            .create(CreateUserRequest {
                email: "not-an-email".to_string(),
                name: "Maria".to_string(),
                role: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![users::Model {
                id: 1,
                email: Some("maria@example.com".to_string()),
                name: "Maria".to_string(),
                role: UserRole::User,
                password_hash: "hash".to_string(),
                must_change_password: false,
                created_at: now,
                updated_at: now,
            }]])
            .into_connection();
        let service = UserService::new(db);

        let err = service
            .create(CreateUserRequest {
                email: "maria@example.com".to_string(),
                name: "Maria".to_string(),
                role: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
