//! Post service: feeds, detail pages and the post form.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator, StorageBackend, sanitize_file_name};
use yatube_db::{
    entities::{comment, post, user},
    repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
        UserRepository,
    },
};

use crate::forms::{FormErrors, Submission, add_error, collect_errors, validate_not_blank};
use crate::pagination::{PAGE_SIZE, Page, PageNumber};
use crate::policy::PostPolicy;
use crate::views::{AuthorView, CommentView, GroupView, PostView};

/// Directory under the media root that holds post images.
pub const IMAGE_DIR: &str = "posts";

const INVALID_IMAGE_MESSAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const INVALID_GROUP_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// An image file sent with the post form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name.
    pub file_name: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

/// Post form fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct PostForm {
    /// Post text; must not be blank.
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,

    /// Group ID; empty means no group.
    #[serde(default)]
    pub group: Option<String>,

    /// Optional picture.
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

impl PostForm {
    fn group_id(&self) -> Option<&str> {
        self.group.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }
}

/// Everything needed to show the create/edit form.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormContext {
    /// Whether an existing post is being edited.
    pub is_edit: bool,
    /// Set when editing.
    pub post_id: Option<String>,
    /// Current text.
    pub text: String,
    /// Selected group ID.
    pub group: Option<String>,
    /// Selectable groups.
    pub groups: Vec<GroupView>,
    /// Field errors from the last submission.
    pub errors: FormErrors,
}

/// A group page.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    /// The group.
    pub group: GroupView,
    /// Current page of its posts.
    pub page: Page<PostView>,
}

/// An author's profile page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    /// The profile owner.
    pub author: AuthorView,
    /// Total number of posts by the author.
    pub post_count: u64,
    /// Number of users following the author.
    pub followers_count: u64,
    /// Number of authors the author follows.
    pub following_count: u64,
    /// Whether the viewer follows the author.
    pub following: bool,
    /// Current page of the author's posts.
    pub page: Page<PostView>,
}

/// A single post with its comments.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    /// The post.
    pub post: PostView,
    /// Total number of posts by the post's author.
    pub author_post_count: u64,
    /// Oldest first.
    pub comments: Vec<CommentView>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    comment_repo: CommentRepository,
    follow_repo: FollowRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        comment_repo: CommentRepository,
        follow_repo: FollowRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            comment_repo,
            follow_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a post by ID.
    pub async fn get(&self, post_id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// The global feed.
    pub async fn index(&self, page: PageNumber) -> AppResult<Page<PostView>> {
        self.feed(PostFilter::All, page).await
    }

    /// Posts in a group.
    pub async fn group_feed(&self, slug: &str, page: PageNumber) -> AppResult<GroupFeed> {
        let group = self.group_repo.get_by_slug(slug).await?;
        let page = self.feed(PostFilter::Group(&group.id), page).await?;
        Ok(GroupFeed {
            group: GroupView::from(&group),
            page,
        })
    }

    /// Posts by an author, with follow state for the viewer.
    pub async fn profile_feed(
        &self,
        username: &str,
        page: PageNumber,
        viewer: Option<&user::Model>,
    ) -> AppResult<ProfileFeed> {
        let author = self.user_repo.get_by_username(username).await?;
        let page = self.feed(PostFilter::Author(&author.id), page).await?;

        let following = match viewer {
            Some(viewer) => self.follow_repo.is_following(&viewer.id, &author.id).await?,
            None => false,
        };

        let followers_count = self.follow_repo.count_followers(&author.id).await?;
        let following_count = self.follow_repo.count_following(&author.id).await?;

        Ok(ProfileFeed {
            author: AuthorView::from(&author),
            post_count: page.count,
            followers_count,
            following_count,
            following,
            page,
        })
    }

    /// Posts by every author the user follows.
    pub async fn follow_feed(&self, user_id: &str, page: PageNumber) -> AppResult<Page<PostView>> {
        let author_ids = self.follow_repo.find_author_ids(user_id).await?;
        self.feed(PostFilter::Authors(&author_ids), page).await
    }

    /// A post, its author's post count and its comments.
    pub async fn detail(&self, post_id: &str) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let author_post_count = self
            .post_repo
            .count(PostFilter::Author(&post.author_id))
            .await?;
        let comments = self.comment_repo.find_by_post(&post.id).await?;
        let comments = self.comment_views(comments).await?;

        let view = self
            .post_views(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Author missing for post {post_id}")))?;

        Ok(PostDetail {
            post: view,
            author_post_count,
            comments,
        })
    }

    /// The empty creation form.
    pub async fn new_form(&self) -> AppResult<PostFormContext> {
        self.form_context(&PostForm::default(), FormErrors::new(), None)
            .await
    }

    /// The edit form filled with the post's current values.
    ///
    /// Fails with [`AppError::Forbidden`] when the actor may not edit the post.
    pub async fn edit_form(
        &self,
        actor: &user::Model,
        post_id: &str,
    ) -> AppResult<PostFormContext> {
        let post = self.editable_post(actor, post_id).await?;
        let form = PostForm {
            text: post.text.clone(),
            group: post.group_id.clone(),
            image: None,
        };
        self.form_context(&form, FormErrors::new(), Some(&post.id))
            .await
    }

    /// The form re-shown with its submitted values and errors.
    pub async fn rejected_form(
        &self,
        form: &PostForm,
        errors: FormErrors,
        post_id: Option<&str>,
    ) -> AppResult<PostFormContext> {
        self.form_context(form, errors, post_id).await
    }

    /// Create a post authored by `author`.
    pub async fn create(
        &self,
        author: &user::Model,
        form: PostForm,
    ) -> AppResult<Submission<post::Model>> {
        let errors = self.clean(&form).await?;
        if !errors.is_empty() {
            debug!(author_id = %author.id, ?errors, "Rejected post form");
            return Ok(Submission::Rejected(errors));
        }

        let image = match &form.image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(form.text.clone()),
            pub_date: Set(chrono::Utc::now().into()),
            author_id: Set(author.id.clone()),
            group_id: Set(form.group_id().map(ToString::to_string)),
            image: Set(image.clone()),
        };

        let post = match self.post_repo.create(model).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(key) = &image {
                    self.remove_image(key).await;
                }
                return Err(e);
            }
        };
        info!(post_id = %post.id, author_id = %author.id, "Created post");
        Ok(Submission::Accepted(post))
    }

    /// Change a post's text, group and optionally its image.
    ///
    /// The publication date and author never change. Fails with
    /// [`AppError::Forbidden`] when the actor may not edit the post.
    pub async fn update(
        &self,
        actor: &user::Model,
        post_id: &str,
        form: PostForm,
    ) -> AppResult<Submission<post::Model>> {
        let post = self.editable_post(actor, post_id).await?;

        let errors = self.clean(&form).await?;
        if !errors.is_empty() {
            debug!(post_id = %post.id, ?errors, "Rejected post edit");
            return Ok(Submission::Rejected(errors));
        }

        let old_image = post.image.clone();
        let mut model = post.into_active_model();
        model.text = Set(form.text.clone());
        model.group_id = Set(form.group_id().map(ToString::to_string));

        let mut replaced_image = None;
        if let Some(upload) = &form.image {
            model.image = Set(Some(self.store_image(upload).await?));
            replaced_image = old_image;
        }

        let updated = self.post_repo.update(model).await?;
        if let Some(key) = replaced_image {
            self.remove_image(&key).await;
        }

        info!(post_id = %updated.id, "Updated post");
        Ok(Submission::Accepted(updated))
    }

    /// Delete a post and its image. Returns the deleted post.
    ///
    /// Fails with [`AppError::Forbidden`] when the actor may not delete it.
    pub async fn delete(&self, actor: &user::Model, post_id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if !PostPolicy::can_delete(actor, &post).is_allowed() {
            return Err(AppError::Forbidden(
                "Only the author can delete this post".to_string(),
            ));
        }

        self.post_repo.delete(&post.id).await?;
        if let Some(key) = &post.image {
            self.remove_image(key).await;
        }

        info!(post_id = %post.id, author_id = %actor.id, "Deleted post");
        Ok(post)
    }

    async fn editable_post(&self, actor: &user::Model, post_id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if !PostPolicy::can_edit(actor, &post).is_allowed() {
            return Err(AppError::Forbidden(
                "Only the author can edit this post".to_string(),
            ));
        }
        Ok(post)
    }

    async fn feed(&self, filter: PostFilter<'_>, page: PageNumber) -> AppResult<Page<PostView>> {
        let count = self.post_repo.count(filter).await?;
        if page.is_past_end(count, PAGE_SIZE) {
            return Ok(Page::new(Vec::new(), page, count, PAGE_SIZE));
        }

        let posts = self
            .post_repo
            .find_window(filter, page.offset(PAGE_SIZE), PAGE_SIZE)
            .await?;
        let items = self.post_views(posts).await?;
        Ok(Page::new(items, page, count, PAGE_SIZE))
    }

    /// Resolve authors and groups for a batch of posts, keeping their order.
    async fn post_views(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let author_ids = unique(posts.iter().map(|p| p.author_id.as_str()));
        let group_ids = unique(posts.iter().filter_map(|p| p.group_id.as_deref()));

        let authors: HashMap<String, AuthorView> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), AuthorView::from(u)))
            .collect();
        let groups: HashMap<String, GroupView> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .iter()
            .map(|g| (g.id.clone(), GroupView::from(g)))
            .collect();

        Ok(posts
            .iter()
            .filter_map(|post| {
                let author = authors.get(&post.author_id)?.clone();
                let group = post
                    .group_id
                    .as_ref()
                    .and_then(|id| groups.get(id))
                    .cloned();
                Some(PostView::new(post, author, group, |key| {
                    self.storage.public_url(key)
                }))
            })
            .collect())
    }

    async fn comment_views(&self, comments: Vec<comment::Model>) -> AppResult<Vec<CommentView>> {
        let author_ids = unique(comments.iter().map(|c| c.author_id.as_str()));
        let authors: HashMap<String, AuthorView> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), AuthorView::from(u)))
            .collect();

        Ok(comments
            .iter()
            .filter_map(|c| Some(CommentView::new(c, authors.get(&c.author_id)?.clone())))
            .collect())
    }

    async fn form_context(
        &self,
        form: &PostForm,
        errors: FormErrors,
        post_id: Option<&str>,
    ) -> AppResult<PostFormContext> {
        let groups = self.group_repo.find_all().await?;
        Ok(PostFormContext {
            is_edit: post_id.is_some(),
            post_id: post_id.map(ToString::to_string),
            text: form.text.clone(),
            group: form.group_id().map(ToString::to_string),
            groups: groups.iter().map(GroupView::from).collect(),
            errors,
        })
    }

    /// Field errors for a submitted form; empty when it is valid.
    async fn clean(&self, form: &PostForm) -> AppResult<FormErrors> {
        let mut errors = match form.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => collect_errors(&e),
        };

        if let Some(group_id) = form.group_id() {
            if self.group_repo.find_by_id(group_id).await?.is_none() {
                add_error(&mut errors, "group", INVALID_GROUP_MESSAGE);
            }
        }

        if let Some(upload) = &form.image {
            if let Err(message) = check_image(upload) {
                add_error(&mut errors, "image", message);
            }
        }

        Ok(errors)
    }

    /// Store an uploaded image under `posts/`, renaming on collision.
    async fn store_image(&self, upload: &ImageUpload) -> AppResult<String> {
        let format = check_image(upload).map_err(AppError::Validation)?;
        let name = sanitize_file_name(&upload.file_name)
            .ok_or_else(|| AppError::Validation(INVALID_IMAGE_MESSAGE.to_string()))?;

        let mut key = format!("{IMAGE_DIR}/{name}");
        if self.storage.exists(&key).await? {
            key = format!("{IMAGE_DIR}/{}", with_suffix(&name, &self.id_gen.generate()));
        }

        let stored = self
            .storage
            .upload(&key, &upload.data, format.to_mime_type())
            .await?;
        debug!(key = %stored.key, size = stored.size, md5 = %stored.md5, "Stored post image");
        Ok(stored.key)
    }

    async fn remove_image(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(key = %key, error = %e, "Failed to remove post image");
        }
    }
}

/// Check that an upload is a decodable GIF, PNG, JPEG or WebP image.
fn check_image(upload: &ImageUpload) -> Result<image::ImageFormat, String> {
    use image::ImageFormat;

    if sanitize_file_name(&upload.file_name).is_none() {
        return Err(INVALID_IMAGE_MESSAGE.to_string());
    }

    let format = image::guess_format(&upload.data).map_err(|_| INVALID_IMAGE_MESSAGE.to_string())?;
    if !matches!(
        format,
        ImageFormat::Gif | ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
    ) {
        return Err(INVALID_IMAGE_MESSAGE.to_string());
    }

    image::load_from_memory_with_format(&upload.data, format)
        .map_err(|_| INVALID_IMAGE_MESSAGE.to_string())?;
    Ok(format)
}

/// `small.gif` + `01hx..7k` → `small_7k.gif` style names, using the tail of `unique`.
fn with_suffix(name: &str, unique: &str) -> String {
    let tail = &unique[unique.len().saturating_sub(7)..];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{tail}.{ext}"),
        _ => format!("{name}_{tail}"),
    }
}

fn unique<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::io::Cursor;
    use yatube_common::LocalStorage;

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgb8(2, 1)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn upload(file_name: &str, data: Vec<u8>) -> ImageUpload {
        ImageUpload {
            file_name: file_name.to_string(),
            data,
        }
    }

    fn user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            name: None,
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> PostService {
        let db = Arc::new(db.into_connection());
        let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
            std::env::temp_dir().join("yatube-post-tests"),
            "/media".to_string(),
        ));
        PostService::new(
            PostRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            GroupRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            FollowRepository::new(db),
            storage,
        )
    }

    #[test]
    fn test_check_image_accepts_gif_and_png() {
        assert_eq!(
            check_image(&upload("small.gif", SMALL_GIF.to_vec())).unwrap(),
            image::ImageFormat::Gif
        );
        assert_eq!(
            check_image(&upload("dot.png", png_bytes())).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[test]
    fn test_check_image_rejects_garbage() {
        let result = check_image(&upload("notes.txt", b"definitely not an image".to_vec()));
        assert_eq!(result.unwrap_err(), INVALID_IMAGE_MESSAGE);
    }

    #[test]
    fn test_check_image_rejects_truncated_png() {
        let mut data = png_bytes();
        data.truncate(20);
        assert!(check_image(&upload("dot.png", data)).is_err());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("small.gif", "01hxyzabcdefg"), "small_abcdefg.gif");
        assert_eq!(with_suffix("README", "abc"), "README_abc");
    }

    #[test]
    fn test_unique_keeps_first_occurrence_order() {
        let ids = unique(["b", "a", "b", "c"].into_iter());
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_blank_group_means_none() {
        let form = PostForm {
            text: "text".to_string(),
            group: Some("  ".to_string()),
            image: None,
        };
        assert_eq!(form.group_id(), None);
    }

    #[tokio::test]
    async fn test_update_by_non_author_is_forbidden() {
        let post = post::Model {
            id: "p1".to_string(),
            text: "original".to_string(),
            pub_date: Utc::now().into(),
            author_id: "author".to_string(),
            group_id: None,
            image: None,
        };
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]),
        );

        let form = PostForm {
            text: "hijacked".to_string(),
            group: None,
            image: None,
        };
        let result = service.update(&user("other"), "p1", form).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_with_blank_text_is_rejected() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let form = PostForm {
            text: "   ".to_string(),
            group: None,
            image: None,
        };
        let submission = service.create(&user("author"), form).await.unwrap();

        match submission {
            Submission::Rejected(errors) => assert!(errors.contains_key("text")),
            Submission::Accepted(_) => panic!("blank text must be rejected"),
        }
    }
}
