//! Optimistic like-toggle coordinator.
//!
//! Per-post state machine: Idle -> Pending -> {Confirmed | RolledBack} ->
//! Idle. The Pending gate serializes toggles per post (a toggle issued
//! while one is in flight for the same post is ignored), the optimistic
//! flip is applied before dispatch, and the revert target is always the
//! pre-toggle snapshot, never a re-derived guess. No ordering is
//! guaranteed across distinct posts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FeedError, Result};
use crate::service::FeedService;
use crate::store::FeedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggleState {
    Idle,
    /// Confirmation in flight; further toggles for this post are ignored
    Pending,
    /// Last toggle landed (possibly server-corrected)
    Confirmed,
    /// Last toggle failed and was reverted
    RolledBack,
}

impl LikeToggleState {
    /// Only Pending gates a new toggle; the other three are resting states
    pub fn accepts_toggle(&self) -> bool {
        !matches!(self, LikeToggleState::Pending)
    }
}

/// What a toggle call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied {
        liked: bool,
        like_count: u32,
        /// Server disagreed with the optimistic flip and won
        corrected: bool,
    },
    /// Gated by an in-flight toggle for the same post
    Ignored,
}

pub struct LikeCoordinator {
    service: Arc<dyn FeedService>,
    store: Arc<FeedStore>,
    states: Mutex<HashMap<Uuid, LikeToggleState>>,
}

impl LikeCoordinator {
    pub fn new(service: Arc<dyn FeedService>, store: Arc<FeedStore>) -> Self {
        Self {
            service,
            store,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub async fn state(&self, post_id: Uuid) -> LikeToggleState {
        self.states
            .lock()
            .await
            .get(&post_id)
            .copied()
            .unwrap_or(LikeToggleState::Idle)
    }

    /// Toggle the viewer's like on one post.
    ///
    /// Flips `viewer_has_liked` and adjusts `like_count` immediately, then
    /// dispatches confirmation. On success the server's authoritative state
    /// wins if it disagrees; on failure the pre-toggle snapshot is
    /// restored and the error is returned.
    pub async fn toggle(&self, post_id: Uuid) -> Result<ToggleOutcome> {
        {
            let mut states = self.states.lock().await;
            let current = states.get(&post_id).copied().unwrap_or(LikeToggleState::Idle);
            if !current.accepts_toggle() {
                debug!(%post_id, "toggle ignored; confirmation already in flight");
                return Ok(ToggleOutcome::Ignored);
            }
            states.insert(post_id, LikeToggleState::Pending);
        }

        let Some(before) = self.store.get_post(post_id).await else {
            self.settle(post_id, LikeToggleState::Idle).await;
            return Err(FeedError::NotFound(format!(
                "post {} is not in the feed window",
                post_id
            )));
        };

        let optimistic_liked = !before.viewer_has_liked;
        let optimistic_count = if optimistic_liked {
            before.like_count.saturating_add(1)
        } else {
            before.like_count.saturating_sub(1)
        };
        self.store
            .update_post(post_id, |p| {
                p.viewer_has_liked = optimistic_liked;
                p.like_count = optimistic_count;
            })
            .await;

        match self.service.toggle_like(post_id).await {
            Ok(outcome) => {
                let corrected = outcome.liked != optimistic_liked;
                if corrected {
                    warn!(
                        %post_id,
                        optimistic = optimistic_liked,
                        server = outcome.liked,
                        "like state conflict; server wins"
                    );
                    self.store
                        .update_post(post_id, |p| {
                            p.viewer_has_liked = outcome.liked;
                            p.like_count = outcome.like_count;
                        })
                        .await;
                }
                self.settle(post_id, LikeToggleState::Confirmed).await;
                let (liked, like_count) = if corrected {
                    (outcome.liked, outcome.like_count)
                } else {
                    (optimistic_liked, optimistic_count)
                };
                Ok(ToggleOutcome::Applied {
                    liked,
                    like_count,
                    corrected,
                })
            }
            Err(err) => {
                warn!(%post_id, error = %err, "like toggle failed; rolling back");
                self.store
                    .update_post(post_id, |p| {
                        p.viewer_has_liked = before.viewer_has_liked;
                        p.like_count = before.like_count;
                    })
                    .await;
                self.settle(post_id, LikeToggleState::RolledBack).await;
                Err(err)
            }
        }
    }

    async fn settle(&self, post_id: Uuid, state: LikeToggleState) {
        self.states.lock().await.insert(post_id, state);
    }
}
