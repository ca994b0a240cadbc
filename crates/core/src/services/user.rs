//! User service.

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::Set;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{entities::user, repositories::UserRepository};

/// Letters, digits and `.@+-_`; letters may be non-ASCII.
#[allow(clippy::unwrap_used)]
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

#[derive(Debug, Validate)]
struct NewUser {
    #[validate(length(min = 1, max = 150), regex(path = *USERNAME_RE))]
    username: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve the user owning a session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Create a local user with a fresh session token.
    pub async fn create(&self, username: &str, name: Option<&str>) -> AppResult<user::Model> {
        let new_user = NewUser {
            username: username.trim().to_string(),
        };
        new_user.validate()?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(new_user.username),
            name: Set(name.map(ToString::to_string)),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    /// Delete a user. Their posts, comments and follows go with them.
    pub async fn delete(&self, username: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_username(username).await?;
        self.user_repo.delete(&user.id).await?;
        tracing::info!(user_id = %user.id, "Deleted user");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            name: None,
            token: Some("secret".to_string()),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", "leo")]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let user = service.authenticate_by_token("secret").await.unwrap();

        assert_eq!(user.username, "leo");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.authenticate_by_token("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_username() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));
        let result = service.create("  ", None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_disallowed_characters() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));

        for username in ["leo tolstoy", "leo/../admin", "leo?next=x"] {
            let result = service.create(username, None).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{username}");
        }
    }

    #[tokio::test]
    async fn test_create_accepts_cyrillic_username() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", "лев.толстой")]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let user = service.create("лев.толстой", None).await.unwrap();

        assert_eq!(user.username, "лев.толстой");
    }
}
