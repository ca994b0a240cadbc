//! Business logic services.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentForm, CommentService};
pub use follow::{FollowOutcome, FollowService};
pub use group::{CreateGroupInput, GroupService};
pub use post::{
    GroupFeed, ImageUpload, PostDetail, PostForm, PostFormContext, PostService, ProfileFeed,
};
pub use user::UserService;
