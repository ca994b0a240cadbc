//! Authorization policy.
//!
//! Policies answer whether an actor may perform an action. A denial is not an
//! error: the web layer turns it into a redirect.

use serde::Serialize;
use yatube_db::entities::{post, user};

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    /// Whether the action may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    const fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Rules for changing posts.
pub struct PostPolicy;

impl PostPolicy {
    /// Only the author may edit a post.
    #[must_use]
    pub fn can_edit(actor: &user::Model, post: &post::Model) -> Decision {
        Decision::from_bool(actor.id == post.author_id)
    }

    /// Only the author may delete a post.
    #[must_use]
    pub fn can_delete(actor: &user::Model, post: &post::Model) -> Decision {
        Decision::from_bool(actor.id == post.author_id)
    }
}

/// Rules for following authors.
pub struct FollowPolicy;

impl FollowPolicy {
    /// Anyone may follow anyone but themselves.
    #[must_use]
    pub fn can_follow(actor: &user::Model, author: &user::Model) -> Decision {
        Decision::from_bool(actor.id != author.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            name: None,
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn post_by(author_id: &str) -> post::Model {
        post::Model {
            id: "p1".to_string(),
            text: "text".to_string(),
            pub_date: Utc::now().into(),
            author_id: author_id.to_string(),
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn test_author_may_edit_and_delete() {
        let author = user("author");
        let post = post_by("author");
        assert_eq!(PostPolicy::can_edit(&author, &post), Decision::Allow);
        assert_eq!(PostPolicy::can_delete(&author, &post), Decision::Allow);
    }

    #[test]
    fn test_other_user_is_denied() {
        let other = user("other");
        let post = post_by("author");
        assert_eq!(PostPolicy::can_edit(&other, &post), Decision::Deny);
        assert!(!PostPolicy::can_delete(&other, &post).is_allowed());
    }

    #[test]
    fn test_self_follow_is_denied() {
        let leo = user("leo");
        assert_eq!(FollowPolicy::can_follow(&leo, &leo), Decision::Deny);
        assert_eq!(FollowPolicy::can_follow(&leo, &user("author")), Decision::Allow);
    }
}
