use std::sync::Arc;
use crate::entities::{password_reset_token_entity as reset_tokens, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::{EmailJob, NotificationQueue};
use crate::models::*;
use crate::utils::{
    JwtService, generate_reset_token, hash_password, validate_email, validate_password,
    verify_password,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};

const RESET_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct AuthService {
    pool: Arc<DatabaseConnection>,
    jwt_service: JwtService,
    queue: NotificationQueue,
}

impl AuthService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>, jwt_service: JwtService, queue: NotificationQueue) -> Self {
        let pool = pool.into();
        Self {
            pool,
            jwt_service,
            queue,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.as_str()))
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid credentials".to_string()));
        }

        self.issue_tokens(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid refresh token".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid refresh token".to_string()))?;

        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let role = user.role.to_string();
        let access_token = self.jwt_service.generate_access_token(user.id, &role)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &role)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    /// Verify the current password, store the new one and clear the
    /// must-change flag.
    pub async fn change_password(
        &self,
        user_id: i64,
        request: ChangePasswordRequest,
    ) -> AppResult<OkResponse> {
        validate_password(&request.next)?;

        let user = users::Entity::find_by_id(user_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(&request.current, &user.password_hash)? {
            return Err(AppError::ValidationError(
                "Invalid credentials".to_string(),
            ));
        }

        let mut model = user.into_active_model();
        model.password_hash = Set(hash_password(&request.next)?);
        model.must_change_password = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.pool).await?;

        Ok(OkResponse { ok: true })
    }

    /// Start the password-reset flow. Always answers ok so the endpoint
    /// cannot be used to probe which emails exist.
    pub async fn request_password_reset(
        &self,
        request: RequestResetRequest,
    ) -> AppResult<OkResponse> {
        validate_email(&request.email)?;

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.as_str()))
            .one(&*self.pool)
            .await?;
        let Some(user) = user else {
            return Ok(OkResponse { ok: true });
        };
        let Some(email) = user.email else {
            return Ok(OkResponse { ok: true });
        };

        let token = generate_reset_token();
        reset_tokens::ActiveModel {
            email: Set(email.clone()),
            token: Set(token.clone()),
            expires_at: Set(Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        self.queue
            .add(
                "password-reset",
                EmailJob {
                    to: email,
                    subject: "Password recovery".to_string(),
                    html: format!("<p>Use this token to reset your password: {token}</p>"),
                },
            )
            .await?;

        Ok(OkResponse { ok: true })
    }

    /// Consume a reset token and store the new password. Token deletion
    /// and the password update commit together.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<OkResponse> {
        if request.token.len() < 10 {
            return Err(AppError::ValidationError("Invalid token".to_string()));
        }
        validate_password(&request.password)?;

        let token_row = reset_tokens::Entity::find()
            .filter(reset_tokens::Column::Token.eq(request.token.as_str()))
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::ValidationError("Invalid token".to_string()))?;

        if token_row.expires_at < Utc::now() {
            return Err(AppError::ValidationError("Invalid token".to_string()));
        }

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(token_row.email.as_str()))
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let txn = self.pool.begin().await?;

        let mut model = user.into_active_model();
        model.password_hash = Set(hash_password(&request.password)?);
        model.must_change_password = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&txn).await?;

        reset_tokens::Entity::delete_by_id(token_row.id)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(OkResponse { ok: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 3600, 86400)
    }

    fn auth(db: DatabaseConnection) -> AuthService {
        AuthService::new(db, jwt(), NotificationQueue::memory())
    }

    fn user_with_password(password: &str) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: 1,
            email: Some("maria@example.com".to_string()),
            name: "Maria".to_string(),
            role: UserRole::User,
            password_hash: hash_password(password).unwrap(),
            must_change_password: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_login_issues_token_pair() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_with_password("password123")]])
            .into_connection();

        let response = auth(db)
            .login(LoginRequest {
                email: "maria@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.user.id, 1);
        let claims = jwt().verify_access_token(&response.access_token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.role, "USER");
        assert!(jwt().verify_refresh_token(&response.refresh_token).is_ok());
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_with_password("password123")]])
            .into_connection();

        let err = auth(db)
            .login(LoginRequest {
                email: "maria@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = auth(db)
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_request_reset_hides_unknown_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let queue = NotificationQueue::memory();
        let service = AuthService::new(db, jwt(), queue.clone());
        let response = service
            .request_password_reset(RequestResetRequest {
                email: "ghost@example.com".to_string(),
            })
            .await
            .unwrap();

        assert!(response.ok);
        assert!(queue.memory_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_rejects_short_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = auth(db)
            .reset_password(ResetPasswordRequest {
                token: "short".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
