//! Repositories wrapping database access per entity.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::{PostFilter, PostRepository};
pub use user::UserRepository;

use sea_orm::{DbErr, SqlErr};
use yatube_common::AppError;

/// Map a database error, surfacing constraint violations as client errors.
pub(crate) fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => AppError::Conflict(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => AppError::BadRequest(msg),
        _ => AppError::Database(err.to_string()),
    }
}
