//! Feed pages.

use axum::extract::{Path, State};
use yatube_common::AppResult;

use crate::{
    extractors::{AuthUser, MaybeAuthUser, PageQuery},
    middleware::AppState,
    response::{PageContext, RenderedPage},
};

/// Global feed, served from the page cache.
pub async fn index(
    State(state): State<AppState>,
    PageQuery(page): PageQuery,
) -> AppResult<RenderedPage> {
    let service = state.post_service.clone();
    let body = state
        .feed_cache
        .index_page(page, move || async move {
            PageContext::Index {
                page_obj: service.index(page).await?,
            }
            .to_body()
        })
        .await?;
    Ok(RenderedPage(body))
}

/// Posts in a group.
pub async fn group_list(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    PageQuery(page): PageQuery,
) -> AppResult<PageContext> {
    let feed = state.post_service.group_feed(&slug, page).await?;
    Ok(PageContext::GroupList {
        group: feed.group,
        page_obj: feed.page,
    })
}

/// An author's posts.
pub async fn profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    PageQuery(page): PageQuery,
) -> AppResult<PageContext> {
    let feed = state
        .post_service
        .profile_feed(&username, page, viewer.as_ref())
        .await?;
    Ok(PageContext::profile(feed))
}

/// Posts by authors the current user follows.
pub async fn follow_index(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    PageQuery(page): PageQuery,
) -> AppResult<PageContext> {
    let page_obj = state.post_service.follow_feed(&user.id, page).await?;
    Ok(PageContext::FollowIndex { page_obj })
}
