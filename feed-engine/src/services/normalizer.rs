//! Post normalizer.
//!
//! Converts heterogeneous remote post records into the canonical `Post`
//! entity. The display kind is derived solely from the first media
//! attachment; tags are translated from the backend vocabulary; missing
//! optional fields become empty strings so nothing downstream handles null.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{MediaAttachment, MediaKind, Post, PostTag, RemoteMedia, RemotePost};

/// Normalize one remote record. `now` pins the relative-time snapshot;
/// callers needing freshness must re-normalize.
pub fn normalize_post(raw: RemotePost, now: DateTime<Utc>) -> Post {
    let media: Vec<MediaAttachment> = raw.media.into_iter().filter_map(normalize_media).collect();

    let mut post = Post {
        id: raw.id,
        author_id: raw.author_id,
        author_name: raw.author_name.unwrap_or_default(),
        avatar_url: raw.avatar_url.unwrap_or_default(),
        university_id: raw.university_id,
        created_at: raw.created_at,
        relative_time: relative_time(raw.created_at, now),
        content: raw.content.unwrap_or_default(),
        tag: raw.tag.as_deref().and_then(PostTag::from_remote),
        media,
        like_count: raw.like_count,
        comment_count: raw.comment_count,
        viewer_has_liked: raw.is_liked,
        ..Post::default()
    };
    post.rederive_kind();
    post
}

/// Unknown media types are dropped rather than guessed from content
fn normalize_media(raw: RemoteMedia) -> Option<MediaAttachment> {
    let kind = MediaKind::from_remote(&raw.media_type)?;
    Some(MediaAttachment {
        id: raw.id.unwrap_or_else(Uuid::new_v4),
        kind,
        url: raw.url,
        thumbnail_url: raw.thumbnail_url.filter(|t| !t.is_empty()),
    })
}

/// Human-readable age snapshot, computed once at normalization time
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(created_at);
    let seconds = delta.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = delta.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = delta.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = delta.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }
    created_at.format("%b %d, %Y").to_string()
}
