//! Page contexts: what each page hands to its template, as JSON.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use yatube_common::{AppError, AppResult};
use yatube_core::{
    AuthorView, CommentView, FormErrors, GroupView, Page, PostDetail, PostFormContext, PostView,
    ProfileFeed,
};

/// Render context of a page, tagged with the page name.
#[derive(Debug, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageContext {
    /// The global feed.
    Index {
        /// Current page of posts.
        page_obj: Page<PostView>,
    },
    /// Posts in one group.
    GroupList {
        /// The group being listed.
        group: GroupView,
        /// Current page of the group's posts.
        page_obj: Page<PostView>,
    },
    /// An author's profile.
    Profile {
        /// The profile owner.
        author: AuthorView,
        /// Total posts by the author.
        post_count: u64,
        /// Users following the author.
        followers_count: u64,
        /// Authors the author follows.
        following_count: u64,
        /// Whether the viewer follows the author.
        following: bool,
        /// Current page of the author's posts.
        page_obj: Page<PostView>,
    },
    /// A single post with its comments.
    PostDetail {
        /// The post.
        post: PostView,
        /// Total posts by the post's author.
        author_post_count: u64,
        /// Comments, oldest first.
        comments: Vec<CommentView>,
        /// The empty comment form.
        form: CommentFormContext,
    },
    /// The create or edit form.
    CreatePost {
        /// Form values, choices and errors.
        form: PostFormContext,
    },
    /// Posts by followed authors.
    FollowIndex {
        /// Current page of posts.
        page_obj: Page<PostView>,
    },
    /// No page at this path.
    NotFound {
        /// The requested path.
        path: String,
    },
}

/// The comment form shown under a post.
#[derive(Debug, Default, Serialize)]
pub struct CommentFormContext {
    /// Comment text.
    pub text: String,
    /// Field errors.
    pub errors: FormErrors,
}

impl PageContext {
    /// Profile page from a profile feed.
    #[must_use]
    pub fn profile(feed: ProfileFeed) -> Self {
        Self::Profile {
            author: feed.author,
            post_count: feed.post_count,
            followers_count: feed.followers_count,
            following_count: feed.following_count,
            following: feed.following,
            page_obj: feed.page,
        }
    }

    /// Detail page with an empty comment form.
    #[must_use]
    pub fn post_detail(detail: PostDetail) -> Self {
        Self::PostDetail {
            post: detail.post,
            author_post_count: detail.author_post_count,
            comments: detail.comments,
            form: CommentFormContext::default(),
        }
    }

    /// Serialize to a JSON body, e.g. for caching.
    pub fn to_body(&self) -> AppResult<String> {
        serde_json::to_string(self).map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Respond with a status other than 200.
    #[must_use]
    pub const fn with_status(self, status: StatusCode) -> PageResponse {
        PageResponse {
            status,
            context: self,
        }
    }
}

impl IntoResponse for PageContext {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A page context with an explicit status code.
#[derive(Debug)]
pub struct PageResponse {
    status: StatusCode,
    context: PageContext,
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.context)).into_response()
    }
}

/// A pre-rendered JSON page body.
#[derive(Debug)]
pub struct RenderedPage(pub String);

impl IntoResponse for RenderedPage {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/json")], self.0).into_response()
    }
}
