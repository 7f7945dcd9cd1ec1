//! Feed compositor.
//!
//! Deterministically interleaves ads into the filtered organic list: one ad
//! after every `interval` organic posts, selected by rotating through the
//! pool. Recomputed in full whenever the organic list changes, so placement
//! is stable relative to post order, never wall-clock. Pure transform:
//! post entities are never mutated.

use crate::models::{Ad, FeedItem, Post};

pub fn compose(posts: &[Post], ads: &[Ad], interval: usize) -> Vec<FeedItem> {
    if interval == 0 || ads.is_empty() {
        return posts.iter().cloned().map(FeedItem::Post).collect();
    }

    let mut items = Vec::with_capacity(posts.len() + posts.len() / interval);
    for (index, post) in posts.iter().enumerate() {
        items.push(FeedItem::Post(post.clone()));
        if (index + 1) % interval == 0 {
            let slot = index / interval;
            items.push(FeedItem::Ad(ads[slot % ads.len()].clone()));
        }
    }
    items
}
