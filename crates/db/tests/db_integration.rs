//! Database integration tests.
//!
//! Run against an in-memory SQLite database with all migrations applied, so
//! cascades and unique indexes are exercised for real.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use sea_orm::{EntityTrait, Set};
use yatube_common::AppError;
use yatube_db::entities::{Comment, Post, comment, follow};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
};
use yatube_db::test_utils::TestDatabase;

fn new_follow(id: &str, user_id: &str, author_id: &str) -> follow::ActiveModel {
    follow::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        author_id: Set(author_id.to_string()),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
async fn test_feed_window_newest_first() {
    let db = TestDatabase::new().await.unwrap();
    let author = db.create_user("author").await.unwrap();
    db.create_posts("p", &author.id, None, 15).await.unwrap();

    let repo = PostRepository::new(db.connection());
    assert_eq!(repo.count(PostFilter::All).await.unwrap(), 15);

    let first = repo.find_window(PostFilter::All, 0, 10).await.unwrap();
    let second = repo.find_window(PostFilter::All, 10, 10).await.unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 5);
    assert_eq!(first[0].id, "p014");
    assert_eq!(second[4].id, "p000");
}

#[tokio::test]
async fn test_group_and_author_filters() {
    let db = TestDatabase::new().await.unwrap();
    let leo = db.create_user("leo").await.unwrap();
    let other = db.create_user("other").await.unwrap();
    let cats = db.create_group("Cats", "cats").await.unwrap();
    db.create_group("Dogs", "dogs").await.unwrap();

    db.create_posts("c", &leo.id, Some(&cats.id), 3).await.unwrap();
    db.create_posts("o", &other.id, None, 2).await.unwrap();

    let repo = PostRepository::new(db.connection());
    assert_eq!(repo.count(PostFilter::Group("cats")).await.unwrap(), 3);
    assert_eq!(repo.count(PostFilter::Group("dogs")).await.unwrap(), 0);
    assert_eq!(repo.count(PostFilter::Author(&other.id)).await.unwrap(), 2);

    let authors = vec![leo.id.clone(), other.id.clone()];
    assert_eq!(repo.count(PostFilter::Authors(&authors)).await.unwrap(), 5);
}

#[tokio::test]
async fn test_deleting_group_keeps_posts() {
    let db = TestDatabase::new().await.unwrap();
    let leo = db.create_user("leo").await.unwrap();
    let cats = db.create_group("Cats", "cats").await.unwrap();
    db.create_posts("p", &leo.id, Some(&cats.id), 2).await.unwrap();

    GroupRepository::new(db.connection())
        .delete(&cats.id)
        .await
        .unwrap();

    let posts = Post::find().all(db.conn.as_ref()).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.group_id.is_none()));
}

#[tokio::test]
async fn test_deleting_post_removes_comments() {
    let db = TestDatabase::new().await.unwrap();
    let leo = db.create_user("leo").await.unwrap();
    let posts = db.create_posts("p", &leo.id, None, 1).await.unwrap();

    let comments = CommentRepository::new(db.connection());
    comments
        .create(comment::ActiveModel {
            id: Set("c1".to_string()),
            post_id: Set(posts[0].id.clone()),
            author_id: Set(leo.id.clone()),
            text: Set("First".to_string()),
            created: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    PostRepository::new(db.connection())
        .delete(&posts[0].id)
        .await
        .unwrap();

    assert!(Comment::find().all(db.conn.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_follow_is_conflict() {
    let db = TestDatabase::new().await.unwrap();
    let leo = db.create_user("leo").await.unwrap();
    let author = db.create_user("author").await.unwrap();

    let repo = FollowRepository::new(db.connection());
    repo.create(new_follow("f1", &leo.id, &author.id))
        .await
        .unwrap();

    let duplicate = repo.create(new_follow("f2", &leo.id, &author.id)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    assert_eq!(repo.count_following(&leo.id).await.unwrap(), 1);
    assert_eq!(repo.find_author_ids(&leo.id).await.unwrap(), vec![author.id]);
}

#[tokio::test]
async fn test_follow_requires_existing_users() {
    let db = TestDatabase::new().await.unwrap();
    let leo = db.create_user("leo").await.unwrap();

    let repo = FollowRepository::new(db.connection());
    let result = repo.create(new_follow("f1", &leo.id, "ghost")).await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}
