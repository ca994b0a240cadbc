//! Read models handed to the web layer.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use yatube_db::entities::{comment, group, post, user};

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    /// User ID.
    pub id: String,
    /// Login name, used in profile URLs.
    pub username: String,
    /// Display name, falling back to the username.
    pub name: String,
}

impl From<&user::Model> for AuthorView {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone().unwrap_or_else(|| user.username.clone()),
        }
    }
}

/// Group as shown next to a post or in a form's choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    /// Group ID.
    pub id: String,
    /// Group title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Free-form description.
    pub description: String,
}

impl From<&group::Model> for GroupView {
    fn from(group: &group::Model) -> Self {
        Self {
            id: group.id.clone(),
            title: group.display_name().to_string(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        }
    }
}

/// A post with its author and group resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    /// Post ID.
    pub id: String,
    /// Full text.
    pub text: String,
    /// Shortened text used as a title.
    pub display_name: String,
    /// Publication date, fixed at creation.
    pub pub_date: DateTime<FixedOffset>,
    /// Author.
    pub author: AuthorView,
    /// Group, if any.
    pub group: Option<GroupView>,
    /// Storage key of the image, e.g. `posts/small.gif`.
    pub image: Option<String>,
    /// Public URL of the image.
    pub image_url: Option<String>,
}

impl PostView {
    /// Build a view; `image_url` maps a storage key to its public URL.
    #[must_use]
    pub fn new(
        post: &post::Model,
        author: AuthorView,
        group: Option<GroupView>,
        image_url: impl Fn(&str) -> String,
    ) -> Self {
        Self {
            id: post.id.clone(),
            text: post.text.clone(),
            display_name: post.display_name(),
            pub_date: post.pub_date,
            author,
            group,
            image: post.image.clone(),
            image_url: post.image.as_deref().map(image_url),
        }
    }
}

/// A comment with its author resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    /// Comment ID.
    pub id: String,
    /// Comment text.
    pub text: String,
    /// Creation time.
    pub created: DateTime<FixedOffset>,
    /// Author.
    pub author: AuthorView,
}

impl CommentView {
    /// Build a view from a comment and its author.
    #[must_use]
    pub fn new(comment: &comment::Model, author: AuthorView) -> Self {
        Self {
            id: comment.id.clone(),
            text: comment.display_name().to_string(),
            created: comment.created,
            author,
        }
    }
}
