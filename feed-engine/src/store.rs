//! In-memory feed store.
//!
//! Owns the single post collection plus the flags the surrounding
//! application renders from. All mutations are copy-on-write over the full
//! collection: the `Arc<Vec<Post>>` is cloned, modified, and swapped under
//! the write lock, so a concurrent reader never observes a partial
//! mutation. Every committed change publishes a fresh `FeedSnapshot` on a
//! watch channel.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Ad, DataSource, FeedSnapshot, FilterPredicate, Post};
use crate::services::compositor;

struct FeedState {
    posts: Arc<Vec<Post>>,
    ads: Arc<Vec<Ad>>,
    filter: FilterPredicate,
    is_loading: bool,
    has_more: bool,
    error: Option<String>,
    source: DataSource,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Arc::new(Vec::new()),
            ads: Arc::new(Vec::new()),
            filter: FilterPredicate::default(),
            is_loading: false,
            has_more: true,
            error: None,
            source: DataSource::Remote,
        }
    }
}

pub struct FeedStore {
    state: RwLock<FeedState>,
    tx: watch::Sender<FeedSnapshot>,
    ad_interval: usize,
}

impl FeedStore {
    pub fn new(ad_interval: usize) -> Self {
        let (tx, _rx) = watch::channel(FeedSnapshot::default());
        Self {
            state: RwLock::new(FeedState::default()),
            tx,
            ad_interval,
        }
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    pub async fn filter(&self) -> FilterPredicate {
        self.state.read().await.filter.clone()
    }

    pub async fn get_post(&self, id: Uuid) -> Option<Post> {
        self.state
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.posts.is_empty()
    }

    /// Replace the active filter, clearing the accumulated window
    pub async fn set_filter(&self, filter: FilterPredicate) {
        let mut state = self.state.write().await;
        state.filter = filter;
        state.posts = Arc::new(Vec::new());
        state.error = None;
        state.source = DataSource::Remote;
        self.publish(&state);
    }

    /// Append one fetched page to the accumulated window
    pub async fn append_page(&self, posts: Vec<Post>) {
        let mut state = self.state.write().await;
        let mut next = (*state.posts).clone();
        next.extend(posts);
        state.posts = Arc::new(next);
        state.source = DataSource::Remote;
        self.publish(&state);
    }

    pub async fn clear_posts(&self) {
        let mut state = self.state.write().await;
        state.posts = Arc::new(Vec::new());
        state.error = None;
        state.source = DataSource::Remote;
        self.publish(&state);
    }

    /// Swap in opt-in sample content for an empty remote feed
    pub async fn load_fallback(&self, posts: Vec<Post>) {
        let mut state = self.state.write().await;
        state.posts = Arc::new(posts);
        state.source = DataSource::Fallback;
        self.publish(&state);
    }

    pub async fn prepend_post(&self, post: Post) {
        let mut state = self.state.write().await;
        let mut next = Vec::with_capacity(state.posts.len() + 1);
        next.push(post);
        next.extend(state.posts.iter().cloned());
        state.posts = Arc::new(next);
        self.publish(&state);
    }

    /// Apply a closure to one post, copy-on-write. Returns the updated post.
    pub async fn update_post<F>(&self, id: Uuid, mutate: F) -> Option<Post>
    where
        F: FnOnce(&mut Post),
    {
        let mut state = self.state.write().await;
        let index = state.posts.iter().position(|p| p.id == id)?;
        let mut next = (*state.posts).clone();
        mutate(&mut next[index]);
        let updated = next[index].clone();
        state.posts = Arc::new(next);
        self.publish(&state);
        Some(updated)
    }

    /// Replace one post wholesale (post-mutation re-fetch). Returns whether
    /// the post was present in the window.
    pub async fn replace_post(&self, post: Post) -> bool {
        let mut state = self.state.write().await;
        let Some(index) = state.posts.iter().position(|p| p.id == post.id) else {
            return false;
        };
        let mut next = (*state.posts).clone();
        next[index] = post;
        state.posts = Arc::new(next);
        self.publish(&state);
        true
    }

    /// Remove a post, reporting its original index for re-insertion
    pub async fn remove_post(&self, id: Uuid) -> Option<(usize, Post)> {
        let mut state = self.state.write().await;
        let index = state.posts.iter().position(|p| p.id == id)?;
        let mut next = (*state.posts).clone();
        let removed = next.remove(index);
        state.posts = Arc::new(next);
        self.publish(&state);
        Some((index, removed))
    }

    /// Re-insert a post at its original index (clamped to the window)
    pub async fn insert_post_at(&self, index: usize, post: Post) {
        let mut state = self.state.write().await;
        let mut next = (*state.posts).clone();
        let index = index.min(next.len());
        next.insert(index, post);
        state.posts = Arc::new(next);
        self.publish(&state);
    }

    /// External handle for the comment subsystem
    pub async fn increment_comment_count(&self, id: Uuid) -> bool {
        self.update_post(id, |p| p.comment_count = p.comment_count.saturating_add(1))
            .await
            .is_some()
    }

    pub async fn decrement_comment_count(&self, id: Uuid) -> bool {
        self.update_post(id, |p| p.comment_count = p.comment_count.saturating_sub(1))
            .await
            .is_some()
    }

    pub async fn set_ads(&self, ads: Vec<Ad>) {
        let mut state = self.state.write().await;
        state.ads = Arc::new(ads);
        self.publish(&state);
    }

    pub async fn set_loading(&self, is_loading: bool) {
        let mut state = self.state.write().await;
        state.is_loading = is_loading;
        self.publish(&state);
    }

    pub async fn set_has_more(&self, has_more: bool) {
        let mut state = self.state.write().await;
        state.has_more = has_more;
        self.publish(&state);
    }

    pub async fn set_error(&self, error: Option<String>) {
        let mut state = self.state.write().await;
        state.error = error;
        self.publish(&state);
    }

    /// Recompose and publish the window: client-side filter, then ad
    /// interleaving. Post entities are never mutated here.
    fn publish(&self, state: &FeedState) {
        let organic: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| state.filter.matches(p))
            .cloned()
            .collect();
        let items = compositor::compose(&organic, &state.ads, self.ad_interval);
        debug!(
            organic = organic.len(),
            items = items.len(),
            loading = state.is_loading,
            "publishing feed snapshot"
        );
        self.tx.send_replace(FeedSnapshot {
            items,
            is_loading: state.is_loading,
            has_more: state.has_more,
            error: state.error.clone(),
            source: state.source,
        });
    }
}
