//! Authentication service.
//!
//! Registration, login and token issuing.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use comanda_core::payload::{LoginRequest, RegisterRequest};
use comanda_core::{CoreError, Role, User};
use comanda_db::{generate_id, Database, UserRecord};

use crate::auth::{hash_password, verify_password, JwtManager};
use crate::error::{ApiError, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A user together with a freshly issued access token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
}

/// Authentication service implementation.
pub struct AuthService {
    db: Database,
    jwt_manager: Arc<JwtManager>,
}

impl AuthService {
    /// Create a new authentication service.
    pub fn new(db: Database, jwt_manager: Arc<JwtManager>) -> Self {
        AuthService { db, jwt_manager }
    }

    /// Creates a CLIENT account and signs it in.
    pub async fn register(&self, payload: RegisterRequest) -> ApiResult<AuthSession> {
        let payload = payload.validate()?;

        if self.db.users().find_by_email(&payload.email).await?.is_some() {
            return Err(CoreError::Conflict {
                entity: "user",
                field: "email",
            }
            .into());
        }

        let now = Utc::now();
        let record = UserRecord {
            user: User {
                id: generate_id(),
                email: payload.email,
                name: payload.name,
                role: Role::Client,
                created_at: now,
                updated_at: now,
            },
            password_hash: hash_password(&payload.password)?,
        };
        self.db.users().insert(&record).await?;

        let access_token = self.jwt_manager.generate_token(&record.user)?;

        info!(user_id = %record.user.id, "User registered");
        Ok(AuthSession {
            user: record.user,
            access_token,
        })
    }

    /// Verifies credentials. Unknown email and wrong password fail alike.
    pub async fn login(&self, payload: LoginRequest) -> ApiResult<AuthSession> {
        let payload = payload.validate()?;

        let record = match self.db.users().find_by_email(&payload.email).await? {
            Some(record) => record,
            None => {
                warn!("Login attempt for unknown email");
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&payload.password, &record.password_hash) {
            warn!(user_id = %record.user.id, "Login attempt with wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = self.jwt_manager.generate_token(&record.user)?;

        info!(user_id = %record.user.id, "Login successful");
        Ok(AuthSession {
            user: record.user,
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::test_db;

    fn service(db: Database) -> AuthService {
        AuthService::new(db, Arc::new(JwtManager::new("test-secret", 3600)))
    }

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: Some("  Ana ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service(test_db().await);

        let session = auth.register(register(" Ana@Example.com ")).await.unwrap();
        assert_eq!(session.user.email, "ana@example.com");
        assert_eq!(session.user.name.as_deref(), Some("Ana"));
        assert_eq!(session.user.role, Role::Client);

        let login = auth
            .login(LoginRequest {
                email: "ana@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, session.user.id);

        let claims = auth.jwt_manager.validate_token(&login.access_token).unwrap();
        assert_eq!(claims.sub, session.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let auth = service(test_db().await);
        auth.register(register("bo@example.com")).await.unwrap();

        let err = auth.register(register("BO@example.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_credentials_share_one_message() {
        let auth = service(test_db().await);
        auth.register(register("cy@example.com")).await.unwrap();

        let wrong_password = auth
            .login(LoginRequest {
                email: "cy@example.com".to_string(),
                password: "secret999".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }
}
