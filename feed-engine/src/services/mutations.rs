//! Mutation pipeline: post create/update/delete plus attachment uploads.
//!
//! Partial-failure contract: the text mutation is never rolled back because
//! an attachment upload failed; the caller instead receives
//! `FeedError::PartialMediaFailure` carrying the saved post. After an
//! update the canonical post is re-fetched in full so the displayed media
//! list always matches server truth. Deletes are optimistic with
//! re-insertion at the original index if the server call fails.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{FeedError, Result};
use crate::models::{MediaAttachment, Post, PostTag, Viewer};
use crate::service::{
    CreatePostRequest, FeedService, MediaUpload, ProgressFn, UpdatePostRequest,
};
use crate::services::normalizer;
use crate::store::FeedStore;

/// Caller-supplied progress observer: (file name, percent)
pub type UploadProgressFn = Arc<dyn Fn(&str, u8) + Send + Sync>;

pub struct MutationPipeline {
    service: Arc<dyn FeedService>,
    store: Arc<FeedStore>,
}

impl MutationPipeline {
    pub fn new(service: Arc<dyn FeedService>, store: Arc<FeedStore>) -> Self {
        Self { service, store }
    }

    /// Create a post, then upload its attachments one by one.
    ///
    /// The new post is prepended to the window with whatever attachments
    /// made it; failed uploads surface as `PartialMediaFailure`.
    pub async fn create(
        &self,
        viewer: Option<&Viewer>,
        content: &str,
        tag: Option<PostTag>,
        media: Vec<MediaUpload>,
        progress: Option<UploadProgressFn>,
    ) -> Result<Post> {
        let viewer = require_viewer(viewer, "creating a post")?;
        if content.trim().is_empty() && media.is_empty() {
            return Err(FeedError::Validation(
                "a post needs text content or at least one attachment".into(),
            ));
        }

        let raw = self
            .service
            .create_post(CreatePostRequest {
                content: content.to_string(),
                tag,
            })
            .await?;
        let mut post = normalizer::normalize_post(raw, Utc::now());
        info!(post_id = %post.id, author = %viewer.user_id, "post created");

        let (attachments, failed) = self.upload_all(post.id, &media, progress.as_ref()).await;
        post.media = attachments;
        post.rederive_kind();
        self.store.prepend_post(post.clone()).await;

        if failed.is_empty() {
            Ok(post)
        } else {
            Err(FeedError::PartialMediaFailure {
                post: Box::new(post),
                failed,
            })
        }
    }

    /// Update a post, upload any new attachments, then re-fetch the
    /// canonical post and swap it into the window. The displayed media
    /// list is never reconstructed from local deltas.
    pub async fn update(
        &self,
        viewer: Option<&Viewer>,
        post_id: Uuid,
        content: Option<String>,
        tag: Option<PostTag>,
        new_media: Vec<MediaUpload>,
        progress: Option<UploadProgressFn>,
    ) -> Result<Post> {
        require_viewer(viewer, "editing a post")?;
        if let Some(content) = &content {
            if content.trim().is_empty() {
                return Err(FeedError::Validation("post content cannot be empty".into()));
            }
        }

        self.service
            .update_post(post_id, UpdatePostRequest { content, tag })
            .await?;

        let (_, failed) = self.upload_all(post_id, &new_media, progress.as_ref()).await;

        let raw = self.service.get_post(post_id).await?;
        let post = normalizer::normalize_post(raw, Utc::now());
        if !self.store.replace_post(post.clone()).await {
            warn!(%post_id, "updated post is not in the current window");
        }

        if failed.is_empty() {
            Ok(post)
        } else {
            Err(FeedError::PartialMediaFailure {
                post: Box::new(post),
                failed,
            })
        }
    }

    /// Optimistically remove the post, re-inserting it at its original
    /// index when the server rejects the delete.
    pub async fn delete(&self, viewer: Option<&Viewer>, post_id: Uuid) -> Result<()> {
        require_viewer(viewer, "deleting a post")?;

        let removed = self.store.remove_post(post_id).await;
        match self.service.delete_post(post_id).await {
            Ok(()) => {
                info!(%post_id, "post deleted");
                Ok(())
            }
            Err(err) => {
                if let Some((index, post)) = removed {
                    warn!(%post_id, index, "delete failed; re-inserting post");
                    self.store.insert_post_at(index, post).await;
                }
                Err(err)
            }
        }
    }

    /// Upload files sequentially, collecting successes and failed names
    async fn upload_all(
        &self,
        post_id: Uuid,
        media: &[MediaUpload],
        progress: Option<&UploadProgressFn>,
    ) -> (Vec<MediaAttachment>, Vec<String>) {
        let mut attachments = Vec::with_capacity(media.len());
        let mut failed = Vec::new();
        for file in media {
            let callback: ProgressFn = match progress {
                Some(observer) => {
                    let observer = Arc::clone(observer);
                    let name = file.file_name.clone();
                    Box::new(move |pct| observer(&name, pct))
                }
                None => Box::new(|_| {}),
            };
            match self.service.upload_media(post_id, file, callback).await {
                Ok(attachment) => attachments.push(attachment),
                Err(err) => {
                    warn!(%post_id, file = %file.file_name, error = %err, "media upload failed");
                    failed.push(file.file_name.clone());
                }
            }
        }
        (attachments, failed)
    }
}

fn require_viewer<'a>(viewer: Option<&'a Viewer>, action: &str) -> Result<&'a Viewer> {
    viewer.ok_or_else(|| FeedError::AuthRequired(format!("{} requires a signed-in member", action)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedPage, MediaKind, RemoteMedia, RemotePost};
    use crate::service::LikeOutcome;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// In-memory feed backend: posts live in a map, uploads can be made to
    /// fail by file name, and every network call is counted.
    struct FakeBackend {
        posts: Mutex<HashMap<Uuid, RemotePost>>,
        failing_uploads: Vec<String>,
        fail_deletes: bool,
        calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                posts: Mutex::new(HashMap::new()),
                failing_uploads: Vec::new(),
                fail_deletes: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_uploads(mut self, names: &[&str]) -> Self {
            self.failing_uploads = names.iter().map(|n| n.to_string()).collect();
            self
        }

        fn failing_deletes(mut self) -> Self {
            self.fail_deletes = true;
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn remote_post(content: &str) -> RemotePost {
            RemotePost {
                id: Uuid::new_v4(),
                author_id: Uuid::new_v4(),
                author_name: Some("Jordan Reyes".into()),
                avatar_url: None,
                university_id: None,
                created_at: Utc::now(),
                content: Some(content.to_string()),
                tag: None,
                media: Vec::new(),
                like_count: 0,
                comment_count: 0,
                is_liked: false,
            }
        }
    }

    #[async_trait]
    impl FeedService for FakeBackend {
        async fn list_posts(
            &self,
            _page: u32,
            _page_size: u32,
            _university_id: Option<Uuid>,
            _tag: Option<PostTag>,
        ) -> Result<FeedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FeedPage {
                page: 1,
                page_size: 10,
                total_pages: 0,
                posts: Vec::new(),
            })
        }

        async fn create_post(&self, req: CreatePostRequest) -> Result<RemotePost> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut post = Self::remote_post(&req.content);
            post.tag = req.tag.map(|t| t.as_remote().to_string());
            self.posts.lock().await.insert(post.id, post.clone());
            Ok(post)
        }

        async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> Result<RemotePost> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut posts = self.posts.lock().await;
            let post = posts
                .get_mut(&id)
                .ok_or_else(|| FeedError::NotFound(id.to_string()))?;
            if let Some(content) = req.content {
                post.content = Some(content);
            }
            if let Some(tag) = req.tag {
                post.tag = Some(tag.as_remote().to_string());
            }
            Ok(post.clone())
        }

        async fn delete_post(&self, id: Uuid) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_deletes {
                return Err(FeedError::Network("delete rejected".into()));
            }
            self.posts.lock().await.remove(&id);
            Ok(())
        }

        async fn get_post(&self, id: Uuid) -> Result<RemotePost> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.posts
                .lock()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| FeedError::NotFound(id.to_string()))
        }

        async fn toggle_like(&self, _id: Uuid) -> Result<LikeOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LikeOutcome {
                liked: true,
                like_count: 1,
            })
        }

        async fn upload_media(
            &self,
            post_id: Uuid,
            file: &MediaUpload,
            progress: ProgressFn,
        ) -> Result<MediaAttachment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_uploads.contains(&file.file_name) {
                return Err(FeedError::Network(format!(
                    "upload of {} interrupted",
                    file.file_name
                )));
            }
            progress(100);
            let attachment = MediaAttachment {
                id: Uuid::new_v4(),
                kind: file.kind,
                url: format!("https://cdn.lumora.dev/{}/{}", post_id, file.file_name),
                thumbnail_url: None,
            };
            let mut posts = self.posts.lock().await;
            if let Some(post) = posts.get_mut(&post_id) {
                post.media.push(RemoteMedia {
                    id: Some(attachment.id),
                    media_type: match file.kind {
                        MediaKind::Image => "image".into(),
                        MediaKind::Video => "video".into(),
                    },
                    url: attachment.url.clone(),
                    thumbnail_url: None,
                });
            }
            Ok(attachment)
        }
    }

    fn viewer() -> Viewer {
        Viewer {
            user_id: Uuid::new_v4(),
            display_name: "Jordan Reyes".into(),
        }
    }

    fn upload(name: &str) -> MediaUpload {
        MediaUpload {
            file_name: name.to_string(),
            kind: MediaKind::Image,
            data: vec![0u8; 4],
        }
    }

    fn pipeline(backend: FakeBackend) -> (Arc<FakeBackend>, Arc<FeedStore>, MutationPipeline) {
        let backend = Arc::new(backend);
        let store = Arc::new(FeedStore::new(8));
        let pipeline = MutationPipeline::new(
            Arc::clone(&backend) as Arc<dyn FeedService>,
            Arc::clone(&store),
        );
        (backend, store, pipeline)
    }

    #[tokio::test]
    async fn create_with_partial_upload_failure_keeps_the_post() {
        let (_, store, pipeline) = pipeline(FakeBackend::new().failing_uploads(&["b.jpg"]));
        let viewer = viewer();

        let err = pipeline
            .create(
                Some(&viewer),
                "Reunion photos from Saturday",
                Some(PostTag::CampusEvent),
                vec![upload("a.jpg"), upload("b.jpg")],
                None,
            )
            .await
            .unwrap_err();

        let FeedError::PartialMediaFailure { post, failed } = err else {
            panic!("expected partial media failure");
        };
        assert_eq!(post.media.len(), 1);
        assert_eq!(failed, vec!["b.jpg".to_string()]);
        // The post is still in the window, first
        let snapshot = store.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].as_post().unwrap().id, post.id);
    }

    #[tokio::test]
    async fn create_without_viewer_issues_no_network_call() {
        let (backend, store, pipeline) = pipeline(FakeBackend::new());

        let err = pipeline
            .create(None, "hello", None, vec![upload("a.jpg")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::AuthRequired(_)));
        assert_eq!(backend.call_count(), 0);
        assert!(store.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_empty_posts_before_dispatch() {
        let (backend, _, pipeline) = pipeline(FakeBackend::new());
        let viewer = viewer();

        let err = pipeline
            .create(Some(&viewer), "   ", None, vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn create_reports_upload_progress() {
        let (_, _, pipeline) = pipeline(FakeBackend::new());
        let viewer = viewer();
        let seen: Arc<std::sync::Mutex<Vec<(String, u8)>>> =
            Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: UploadProgressFn =
            Arc::new(move |name, pct| sink.lock().unwrap().push((name.to_string(), pct)));

        pipeline
            .create(
                Some(&viewer),
                "graduation day",
                None,
                vec![upload("cap.jpg")],
                Some(progress),
            )
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), &[("cap.jpg".to_string(), 100)]);
    }

    #[tokio::test]
    async fn update_refetches_canonical_post() {
        let (backend, store, pipeline) = pipeline(FakeBackend::new());
        let viewer = viewer();

        let created = pipeline
            .create(Some(&viewer), "first draft", None, vec![], None)
            .await
            .unwrap();

        let updated = pipeline
            .update(
                Some(&viewer),
                created.id,
                Some("final version".into()),
                Some(PostTag::SuccessStory),
                vec![upload("photo.jpg")],
                None,
            )
            .await
            .unwrap();

        // The swapped-in post reflects server truth, uploads included
        assert_eq!(updated.content, "final version");
        assert_eq!(updated.tag, Some(PostTag::SuccessStory));
        assert_eq!(updated.media.len(), 1);
        let in_window = store.get_post(created.id).await.unwrap();
        assert_eq!(in_window, updated);
        assert!(backend.call_count() >= 4);
    }

    #[tokio::test]
    async fn failed_delete_reinserts_at_original_index() {
        let (_, store, pipeline) = pipeline(FakeBackend::new().failing_deletes());
        let viewer = viewer();

        let mut posts = Vec::new();
        for content in ["a", "b", "c"] {
            posts.push(
                pipeline
                    .create(Some(&viewer), content, None, vec![], None)
                    .await
                    .unwrap(),
            );
        }
        // Window order after three prepends: c, b, a
        let target = posts[1].id;

        let err = pipeline.delete(Some(&viewer), target).await.unwrap_err();
        assert!(matches!(err, FeedError::Network(_)));

        let snapshot = store.snapshot();
        let order: Vec<&str> = snapshot
            .items
            .iter()
            .filter_map(|i| i.as_post().map(|p| p.content.as_str()))
            .collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn successful_delete_removes_from_window() {
        let (_, store, pipeline) = pipeline(FakeBackend::new());
        let viewer = viewer();
        let post = pipeline
            .create(Some(&viewer), "short-lived", None, vec![], None)
            .await
            .unwrap();

        pipeline.delete(Some(&viewer), post.id).await.unwrap();
        assert!(store.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn delete_without_viewer_fails_fast() {
        let (backend, _, pipeline) = pipeline(FakeBackend::new());
        let err = pipeline.delete(None, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, FeedError::AuthRequired(_)));
        assert_eq!(backend.call_count(), 0);
    }
}
