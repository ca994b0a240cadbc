//! Group service.

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{
    entities::group::{self, TITLE_MAX_LENGTH},
    repositories::GroupRepository,
};

/// Slugs allowed in group URLs.
#[allow(clippy::unwrap_used)]
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Derived from the title when omitted.
    #[validate(regex(path = *SLUG_RE))]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: String,
}

/// Group service for business logic.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository) -> Self {
        Self {
            group_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a group. A taken slug is a conflict.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        let slug = match input.slug {
            Some(slug) => slug,
            None => slugify(&input.title).ok_or_else(|| {
                AppError::Validation("Cannot derive a slug from the title".to_string())
            })?,
        };

        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            slug: Set(slug),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
        };

        let group = self.group_repo.create(model).await?;
        tracing::info!(group_id = %group.id, slug = %group.slug, "Created group");
        Ok(group)
    }

    /// All groups ordered by title.
    pub async fn list(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_all().await
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.group_repo.get_by_slug(slug).await
    }

    /// Delete a group. Its posts remain, ungrouped.
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_slug(slug).await?;
        self.group_repo.delete(&group.id).await?;
        tracing::info!(group_id = %group.id, "Deleted group");
        Ok(())
    }
}

/// Turn a title into a URL slug: lowercase ASCII words joined by `-`.
///
/// Returns `None` when the title has no ASCII letters or digits.
#[must_use]
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug
        .trim_end_matches('-')
        .chars()
        .take(TITLE_MAX_LENGTH)
        .collect();
    if slug.is_empty() { None } else { Some(slug) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Cats and Dogs").as_deref(), Some("cats-and-dogs"));
        assert_eq!(slugify("  Leo -- Tolstoy  ").as_deref(), Some("leo-tolstoy"));
        assert_eq!(slugify("snake_case").as_deref(), Some("snake_case"));
        assert_eq!(slugify("Лев Толстой"), None);
    }

    #[test]
    fn test_slug_pattern() {
        assert!(SLUG_RE.is_match("test-slug_1"));
        assert!(!SLUG_RE.is_match("bad slug"));
        assert!(!SLUG_RE.is_match(""));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = GroupService::new(GroupRepository::new(db));

        let result = service
            .create(CreateGroupInput {
                title: "Cats".to_string(),
                slug: Some("no spaces".to_string()),
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_long_title() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = GroupService::new(GroupRepository::new(db));

        let result = service
            .create(CreateGroupInput {
                title: "x".repeat(TITLE_MAX_LENGTH + 1),
                slug: None,
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
