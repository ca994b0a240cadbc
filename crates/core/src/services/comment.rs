//! Comment service.

use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository},
};

use crate::forms::{Submission, collect_errors, validate_not_blank};

/// Comment form fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post. Blank text is rejected without saving.
    pub async fn add(
        &self,
        author: &user::Model,
        post_id: &str,
        form: CommentForm,
    ) -> AppResult<Submission<comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if let Err(e) = form.validate() {
            return Ok(Submission::Rejected(collect_errors(&e)));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author.id.clone()),
            text: Set(form.text),
            created: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "Added comment");
        Ok(Submission::Accepted(comment))
    }

}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use yatube_common::AppError;
    use yatube_db::entities::post;

    fn author() -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "leo".to_string(),
            name: None,
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> CommentService {
        let db = Arc::new(db.into_connection());
        CommentService::new(
            CommentRepository::new(Arc::clone(&db)),
            PostRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_add_to_missing_post() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
        );

        let result = service
            .add(
                &author(),
                "missing",
                CommentForm {
                    text: "Hi".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let post = post::Model {
            id: "p1".to_string(),
            text: "text".to_string(),
            pub_date: Utc::now().into(),
            author_id: "u1".to_string(),
            group_id: None,
            image: None,
        };
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]));

        let result = service
            .add(&author(), "p1", CommentForm::default())
            .await
            .unwrap();

        assert!(result.accepted().is_none());
    }
}
