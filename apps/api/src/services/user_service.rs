//! User administration service.

use chrono::Utc;
use tracing::info;

use comanda_core::payload::UpdateUserRequest;
use comanda_core::pricing::merge_nullable;
use comanda_core::{CoreError, User};
use comanda_db::{Database, UserRecord};

use crate::auth::hash_password;
use crate::error::ApiResult;

pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        UserService { db }
    }

    pub async fn find_all(&self) -> ApiResult<Vec<User>> {
        Ok(self.db.users().list().await?)
    }

    pub async fn find_one(&self, id: &str) -> ApiResult<User> {
        Ok(self.get(id).await?.user)
    }

    /// Applies a sparse patch. A new password is re-hashed.
    pub async fn update(&self, id: &str, request: UpdateUserRequest) -> ApiResult<User> {
        let mut record = self.get(id).await?;
        let patch = request.validate()?;

        if let Some(email) = patch.email {
            if email != record.user.email {
                if let Some(other) = self.db.users().find_by_email(&email).await? {
                    if other.user.id != id {
                        return Err(CoreError::Conflict {
                            entity: "user",
                            field: "email",
                        }
                        .into());
                    }
                }
            }
            record.user.email = email;
        }
        if let Some(password) = patch.password {
            record.password_hash = hash_password(&password)?;
        }
        record.user.name = merge_nullable(patch.name, record.user.name);
        if let Some(role) = patch.role {
            record.user.role = role;
        }
        record.user.updated_at = Utc::now();

        self.db.users().update(&record).await?;

        info!(user_id = %id, role = record.user.role.as_str(), "User updated");
        Ok(record.user)
    }

    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        self.get(id).await?;
        self.db.users().delete(id).await?;

        info!(user_id = %id, "User removed");
        Ok(())
    }

    /// 404 unless the user exists.
    pub async fn ensure_exists(&self, id: &str) -> ApiResult<()> {
        self.get(id).await.map(drop)
    }

    async fn get(&self, id: &str) -> ApiResult<UserRecord> {
        self.db
            .users()
            .get_record(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{verify_password, JwtManager};
    use crate::error::ApiError;
    use crate::services::test_support::test_db;
    use crate::services::AuthService;
    use comanda_core::payload::RegisterRequest;
    use comanda_core::Role;
    use std::sync::Arc;

    async fn setup() -> (UserService, User, User) {
        let db = test_db().await;
        let auth = AuthService::new(db.clone(), Arc::new(JwtManager::new("s", 3600)));

        let mut users = Vec::new();
        for email in ["ana@example.com", "bo@example.com"] {
            let session = auth
                .register(RegisterRequest {
                    email: email.to_string(),
                    password: "secret123".to_string(),
                    name: None,
                })
                .await
                .unwrap();
            users.push(session.user);
        }
        let bo = users.pop().unwrap();
        let ana = users.pop().unwrap();
        (UserService::new(db), ana, bo)
    }

    fn patch(value: serde_json::Value) -> UpdateUserRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_update_role_name_and_password() {
        let (service, ana, _) = setup().await;

        let updated = service
            .update(
                &ana.id,
                patch(serde_json::json!({
                    "role": "STAFF",
                    "name": "Ana Lima",
                    "password": "new-secret-1"
                })),
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Staff);
        assert_eq!(updated.name.as_deref(), Some("Ana Lima"));

        let record = service.get(&ana.id).await.unwrap();
        assert!(verify_password("new-secret-1", &record.password_hash));
    }

    #[tokio::test]
    async fn test_email_taken_by_other_user() {
        let (service, ana, _) = setup().await;

        let err = service
            .update(&ana.id, patch(serde_json::json!({ "email": "bo@example.com" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_patch_rejected() {
        let (service, ana, _) = setup().await;

        let err = service
            .update(
                &ana.id,
                patch(serde_json::json!({ "role": "VIP_CLIENT", "password": "short" })),
            )
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert!(errors.has_field("role"));
                assert!(errors.has_field("password"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove() {
        let (service, ana, bo) = setup().await;

        service.remove(&ana.id).await.unwrap();
        let remaining = service.find_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, bo.id);
        assert!(matches!(
            service.find_one(&ana.id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
