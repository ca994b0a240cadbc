//! Follow service.

use sea_orm::Set;
use serde::Serialize;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};

use crate::policy::FollowPolicy;

/// What a follow request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowOutcome {
    /// A new follow was recorded.
    Created,
    /// The follow already existed; nothing changed.
    AlreadyFollowing,
    /// Users cannot follow themselves; nothing changed.
    SelfFollow,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow the author with the given username.
    ///
    /// Following twice, or following oneself, leaves the data unchanged.
    pub async fn follow(&self, actor: &user::Model, username: &str) -> AppResult<FollowOutcome> {
        let author = self.user_repo.get_by_username(username).await?;

        if !FollowPolicy::can_follow(actor, &author).is_allowed() {
            return Ok(FollowOutcome::SelfFollow);
        }

        if self.follow_repo.is_following(&actor.id, &author.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(actor.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        match self.follow_repo.create(model).await {
            Ok(_) => {
                tracing::info!(user_id = %actor.id, author_id = %author.id, "Followed author");
                Ok(FollowOutcome::Created)
            }
            // Lost a race with a concurrent request for the same pair.
            Err(AppError::Conflict(_)) => Ok(FollowOutcome::AlreadyFollowing),
            Err(e) => Err(e),
        }
    }

    /// Stop following an author. Returns whether a follow was removed.
    pub async fn unfollow(&self, actor: &user::Model, username: &str) -> AppResult<bool> {
        let author = self.user_repo.get_by_username(username).await?;
        let removed = self.follow_repo.delete_by_pair(&actor.id, &author.id).await?;
        if removed {
            tracing::info!(user_id = %actor.id, author_id = %author.id, "Unfollowed author");
        }
        Ok(removed)
    }

}
