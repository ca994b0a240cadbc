//! Post pages: detail, create, edit and delete.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use yatube_common::{AppError, AppResult};
use yatube_core::{ImageUpload, PostForm, Submission};

use crate::{extractors::AuthUser, middleware::AppState, response::PageContext, urls};

/// A post with its comments.
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<PageContext> {
    let detail = state.post_service.detail(&post_id).await?;
    Ok(PageContext::post_detail(detail))
}

/// The empty post form.
pub async fn create_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<PageContext> {
    let form = state.post_service.new_form().await?;
    Ok(PageContext::CreatePost { form })
}

/// Publish a post, then go to the author's profile.
pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_post_form(multipart).await?;

    match state.post_service.create(&user, form.clone()).await? {
        Submission::Accepted(_) => Ok(Redirect::to(&urls::profile(&user.username)).into_response()),
        Submission::Rejected(errors) => {
            let form = state.post_service.rejected_form(&form, errors, None).await?;
            Ok(PageContext::CreatePost { form }
                .with_status(StatusCode::BAD_REQUEST)
                .into_response())
        }
    }
}

/// The edit form. Anyone but the author goes back to the post.
pub async fn edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    match state.post_service.edit_form(&user, &post_id).await {
        Ok(form) => Ok(PageContext::CreatePost { form }.into_response()),
        Err(AppError::Forbidden(_)) => Ok(Redirect::to(&urls::post_detail(&post_id)).into_response()),
        Err(e) => Err(e),
    }
}

/// Save an edit, then go back to the post.
pub async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_post_form(multipart).await?;

    match state.post_service.update(&user, &post_id, form.clone()).await {
        Ok(Submission::Accepted(post)) => {
            Ok(Redirect::to(&urls::post_detail(&post.id)).into_response())
        }
        Ok(Submission::Rejected(errors)) => {
            let form = state
                .post_service
                .rejected_form(&form, errors, Some(&post_id))
                .await?;
            Ok(PageContext::CreatePost { form }
                .with_status(StatusCode::BAD_REQUEST)
                .into_response())
        }
        Err(AppError::Forbidden(_)) => {
            Ok(Redirect::to(&urls::post_detail(&post_id)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Delete a post, then go to the author's profile.
pub async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Redirect> {
    match state.post_service.delete(&user, &post_id).await {
        Ok(_) => Ok(Redirect::to(&urls::profile(&user.username))),
        Err(AppError::Forbidden(_)) => Ok(Redirect::to(&urls::post_detail(&post_id))),
        Err(e) => Err(e),
    }
}

/// Read `text`, `group` and `image` from a multipart post form.
///
/// An empty file part means no image was chosen.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "text" => {
                form.text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "group" => {
                let group = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.group = Some(group).filter(|g| !g.trim().is_empty());
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !data.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
