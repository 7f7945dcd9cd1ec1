//! Engine facade.
//!
//! Owns the store, the cursor, the like coordinator, and the mutation
//! pipeline, and exposes the surface the surrounding application consumes:
//! the composed feed window (via snapshots), page fetching with retry,
//! filter-driven refetch, like toggling, comment-count handles, and post
//! mutations. Everything network-facing runs on the cooperative tokio
//! model; a suspended call never blocks the others.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    Ad, FeedSnapshot, FilterPredicate, Post, PostTag, Viewer,
};
use crate::service::{FeedService, MediaUpload};
use crate::services::likes::{LikeCoordinator, ToggleOutcome};
use crate::services::mutations::{MutationPipeline, UploadProgressFn};
use crate::services::normalizer;
use crate::services::pagination::{PaginationCursor, RequestSequence};
use crate::store::FeedStore;

pub struct FeedEngine {
    config: EngineConfig,
    service: Arc<dyn FeedService>,
    store: Arc<FeedStore>,
    cursor: Mutex<PaginationCursor>,
    requests: RequestSequence,
    likes: LikeCoordinator,
    mutations: MutationPipeline,
    viewer: RwLock<Option<Viewer>>,
}

impl FeedEngine {
    pub fn new(service: Arc<dyn FeedService>, config: EngineConfig) -> Self {
        let store = Arc::new(FeedStore::new(config.ad_interval));
        Self {
            likes: LikeCoordinator::new(Arc::clone(&service), Arc::clone(&store)),
            mutations: MutationPipeline::new(Arc::clone(&service), Arc::clone(&store)),
            cursor: Mutex::new(PaginationCursor::new()),
            requests: RequestSequence::new(),
            viewer: RwLock::new(None),
            config,
            service,
            store,
        }
    }

    /// Subscribe to feed window updates
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.store.subscribe()
    }

    /// The most recently published window
    pub fn snapshot(&self) -> FeedSnapshot {
        self.store.snapshot()
    }

    pub async fn set_viewer(&self, viewer: Viewer) {
        *self.viewer.write().await = Some(viewer);
    }

    pub async fn clear_viewer(&self) {
        *self.viewer.write().await = None;
    }

    /// Replace the ad pool used for interleaving
    pub async fn set_ads(&self, ads: Vec<Ad>) {
        self.store.set_ads(ads).await;
    }

    /// Reset the cursor and fetch page 1. Invoked on mount.
    pub async fn initial_load(&self) -> Result<()> {
        self.cursor.lock().await.reset();
        self.store.clear_posts().await;
        self.fetch_next_page().await
    }

    /// Fetch the next page when one is available and none is in flight;
    /// otherwise a no-op.
    pub async fn fetch_next_page(&self) -> Result<()> {
        let page = {
            let mut cursor = self.cursor.lock().await;
            match cursor.begin_fetch() {
                Some(page) => page,
                None => return Ok(()),
            }
        };
        let request_id = self.requests.next();
        self.store.set_loading(true).await;

        let filter = self.store.filter().await;
        let (university_id, tag) = filter.server_params();
        debug!(page, request_id, ?tag, "fetching feed page");

        let result = self
            .service
            .list_posts(page, self.config.page_size, university_id, tag)
            .await;

        if !self.requests.is_latest(request_id) {
            debug!(page, request_id, "discarding stale page response");
            return Ok(());
        }

        match result {
            Ok(remote_page) => {
                let now = Utc::now();
                let posts: Vec<Post> = remote_page
                    .posts
                    .into_iter()
                    .map(|raw| normalizer::normalize_post(raw, now))
                    .collect();

                let has_more = {
                    let mut cursor = self.cursor.lock().await;
                    cursor.complete_fetch(remote_page.total_pages);
                    cursor.has_more()
                };
                self.store.append_page(posts).await;
                self.store.set_has_more(has_more).await;
                self.store.set_error(None).await;
                self.store.set_loading(false).await;

                if page == 1 && self.config.enable_fallback && self.store.is_empty().await {
                    info!("remote feed is empty; loading fallback sample content");
                    self.store.load_fallback(sample_posts()).await;
                }
                Ok(())
            }
            Err(err) => {
                warn!(page, error = %err, "page fetch failed");
                self.cursor.lock().await.fail_fetch();
                self.store.set_loading(false).await;
                self.store.set_error(Some(err.to_string())).await;
                Err(err)
            }
        }
    }

    /// Re-issue the identical failed request. Already-loaded items are
    /// kept; the cursor did not advance on failure.
    pub async fn retry(&self) -> Result<()> {
        self.store.set_error(None).await;
        self.fetch_next_page().await
    }

    /// Apply a new filter predicate: reset the cursor, clear the window,
    /// and fetch page 1 under a fresh request id. A late response for the
    /// previous filter is discarded as stale.
    pub async fn set_filter(&self, filter: FilterPredicate) -> Result<()> {
        info!(?filter, "filter changed; resetting cursor");
        self.cursor.lock().await.reset();
        self.store.set_filter(filter).await;
        self.fetch_next_page().await
    }

    /// Toggle the viewer's like on a post (optimistic, serialized per post)
    pub async fn toggle_like(&self, post_id: Uuid) -> Result<ToggleOutcome> {
        self.likes.toggle(post_id).await
    }

    /// Invoked by the comment subsystem when a comment lands on a post
    pub async fn increment_comment_count(&self, post_id: Uuid) -> bool {
        self.store.increment_comment_count(post_id).await
    }

    /// Invoked by the comment subsystem when a comment is removed
    pub async fn decrement_comment_count(&self, post_id: Uuid) -> bool {
        self.store.decrement_comment_count(post_id).await
    }

    pub async fn create_post(
        &self,
        content: &str,
        tag: Option<PostTag>,
        media: Vec<MediaUpload>,
        progress: Option<UploadProgressFn>,
    ) -> Result<Post> {
        let viewer = self.viewer.read().await.clone();
        self.mutations
            .create(viewer.as_ref(), content, tag, media, progress)
            .await
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        content: Option<String>,
        tag: Option<PostTag>,
        new_media: Vec<MediaUpload>,
        progress: Option<UploadProgressFn>,
    ) -> Result<Post> {
        let viewer = self.viewer.read().await.clone();
        self.mutations
            .update(viewer.as_ref(), post_id, content, tag, new_media, progress)
            .await
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        let viewer = self.viewer.read().await.clone();
        self.mutations.delete(viewer.as_ref(), post_id).await
    }
}

/// Static sample content for the opt-in empty-feed fallback
fn sample_posts() -> Vec<Post> {
    let now = Utc::now();
    let entries = [
        (
            "Welcome to the alumni feed! Share a milestone, a job opening, or a favorite campus memory.",
            Some(PostTag::SuccessStory),
            Duration::hours(2),
        ),
        (
            "The mentorship program is matching again this semester. Sign up to mentor a recent graduate.",
            Some(PostTag::Mentorship),
            Duration::hours(8),
        ),
        (
            "Homecoming weekend is around the corner. See who else from your class is attending.",
            Some(PostTag::CampusEvent),
            Duration::days(1),
        ),
    ];
    entries
        .into_iter()
        .map(|(content, tag, age)| {
            let created_at = now - age;
            Post {
                author_name: "Lumora Team".to_string(),
                created_at,
                relative_time: normalizer::relative_time(created_at, now),
                content: content.to_string(),
                tag,
                ..Post::default()
            }
        })
        .collect()
}
