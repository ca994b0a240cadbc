//! Test utilities for database operations.
//!
//! Integration tests run against a private in-memory SQLite database with
//! the full schema applied, so foreign-key actions and unique indexes behave
//! like they do in production.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set,
    prelude::DateTimeWithTimeZone,
};
use sea_orm_migration::MigratorTrait;

use crate::entities::{group, post, user};
use crate::migrations::Migrator;

/// In-memory SQLite URL. Each pooled connection would get its own database,
/// so the pool is pinned to a single connection.
pub const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

/// A migrated throwaway database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory database and run all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(SQLITE_MEMORY_URL);
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared handle to the connection, as repositories expect it.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert a user with the given username. The id equals the username.
    pub async fn create_user(&self, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(username.to_string()),
            username: Set(username.to_string()),
            name: Set(None),
            token: Set(Some(format!("token-{username}"))),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a group. The id equals the slug.
    pub async fn create_group(&self, title: &str, slug: &str) -> Result<group::Model, DbErr> {
        group::ActiveModel {
            id: Set(slug.to_string()),
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set(format!("Description of {title}")),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a post with an explicit id and publication date.
    pub async fn create_post_at(
        &self,
        id: &str,
        author_id: &str,
        group_id: Option<&str>,
        text: &str,
        pub_date: DateTimeWithTimeZone,
    ) -> Result<post::Model, DbErr> {
        post::ActiveModel {
            id: Set(id.to_string()),
            text: Set(text.to_string()),
            pub_date: Set(pub_date),
            author_id: Set(author_id.to_string()),
            group_id: Set(group_id.map(ToString::to_string)),
            image: Set(None),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert `count` posts whose publication dates increase with their index,
    /// so `{prefix}{count-1}` is the newest. Returns them oldest first.
    pub async fn create_posts(
        &self,
        prefix: &str,
        author_id: &str,
        group_id: Option<&str>,
        count: usize,
    ) -> Result<Vec<post::Model>, DbErr> {
        let base = Utc::now() - Duration::hours(1);
        let mut posts = Vec::with_capacity(count);
        for i in 0..count {
            let pub_date = base + Duration::seconds(i as i64);
            posts.push(
                self.create_post_at(
                    &format!("{prefix}{i:03}"),
                    author_id,
                    group_id,
                    &format!("Post number {i}"),
                    pub_date.into(),
                )
                .await?,
            );
        }
        Ok(posts)
    }
}
