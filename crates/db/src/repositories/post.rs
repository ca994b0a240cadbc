//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use yatube_common::{AppError, AppResult};

use super::map_db_err;

/// Which posts a feed contains.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter<'a> {
    /// Every post.
    All,
    /// Posts in one group.
    Group(&'a str),
    /// Posts by one author.
    Author(&'a str),
    /// Posts by any of several authors.
    Authors(&'a [String]),
}

impl PostFilter<'_> {
    fn apply(self, query: Select<Post>) -> Select<Post> {
        match self {
            Self::All => query,
            Self::Group(group_id) => query.filter(post::Column::GroupId.eq(group_id)),
            Self::Author(author_id) => query.filter(post::Column::AuthorId.eq(author_id)),
            Self::Authors(author_ids) => {
                query.filter(post::Column::AuthorId.is_in(author_ids.to_vec()))
            }
        }
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Count posts matching a filter.
    pub async fn count(&self, filter: PostFilter<'_>) -> AppResult<u64> {
        if let PostFilter::Authors([]) = filter {
            return Ok(0);
        }

        filter
            .apply(Post::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch a window of posts matching a filter, newest first.
    ///
    /// Ties on `pub_date` are broken by ID so that windows never overlap.
    pub async fn find_window(
        &self,
        filter: PostFilter<'_>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        if let PostFilter::Authors([]) = filter {
            return Ok(vec![]);
        }

        filter
            .apply(Post::find())
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a post. Its comments go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
