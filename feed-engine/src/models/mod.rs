//! Canonical feed entities and wire models.
//!
//! `RemotePost`/`RemoteMedia` mirror the server payload (camelCase, lenient
//! defaults); `Post` is the normalized in-memory entity the rest of the
//! engine works with. Wire records never leak past the normalizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attachment media kind as understood by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_remote(raw: &str) -> Option<Self> {
        match raw {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Display type of a post, derived solely from its first attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Image,
    Video,
}

/// The fixed five-value tag vocabulary.
///
/// Backend wire form is snake_case (`success_story`); the presentation
/// badge form is kebab-case (`success-story`). An unmapped or absent remote
/// tag means "no badge", never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostTag {
    SuccessStory,
    JobOpportunity,
    CampusEvent,
    Mentorship,
    Fundraiser,
}

impl PostTag {
    /// Translate the backend snake_case vocabulary
    pub fn from_remote(raw: &str) -> Option<Self> {
        match raw {
            "success_story" => Some(PostTag::SuccessStory),
            "job_opportunity" => Some(PostTag::JobOpportunity),
            "campus_event" => Some(PostTag::CampusEvent),
            "mentorship" => Some(PostTag::Mentorship),
            "fundraiser" => Some(PostTag::Fundraiser),
            _ => None,
        }
    }

    /// Backend query-parameter form
    pub fn as_remote(&self) -> &'static str {
        match self {
            PostTag::SuccessStory => "success_story",
            PostTag::JobOpportunity => "job_opportunity",
            PostTag::CampusEvent => "campus_event",
            PostTag::Mentorship => "mentorship",
            PostTag::Fundraiser => "fundraiser",
        }
    }

    /// Kebab-case badge identifier used by the presentation layer
    pub fn badge(&self) -> &'static str {
        match self {
            PostTag::SuccessStory => "success-story",
            PostTag::JobOpportunity => "job-opportunity",
            PostTag::CampusEvent => "campus-event",
            PostTag::Mentorship => "mentorship",
            PostTag::Fundraiser => "fundraiser",
        }
    }
}

/// A media attachment owned by its parent post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub id: Uuid,
    pub kind: MediaKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Canonical normalized post entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub avatar_url: String,
    pub university_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Snapshot taken at normalization time; re-normalize for freshness
    pub relative_time: String,
    pub content: String,
    pub tag: Option<PostTag>,
    pub kind: PostKind,
    /// Primary image url when `kind == Image`
    pub image_url: Option<String>,
    /// Playback url when `kind == Video`
    pub video_url: Option<String>,
    pub video_thumbnail_url: Option<String>,
    pub media: Vec<MediaAttachment>,
    pub like_count: u32,
    pub comment_count: u32,
    pub viewer_has_liked: bool,
}

impl Post {
    /// Re-derive `kind` and the presentation urls from the media list.
    ///
    /// The display type comes from `media[0]` only; text content never
    /// influences it.
    pub fn rederive_kind(&mut self) {
        self.image_url = None;
        self.video_url = None;
        self.video_thumbnail_url = None;
        match self.media.first() {
            Some(first) if first.kind == MediaKind::Image => {
                self.kind = PostKind::Image;
                self.image_url = Some(first.url.clone());
            }
            Some(first) => {
                self.kind = PostKind::Video;
                self.video_url = Some(first.url.clone());
                self.video_thumbnail_url = first.thumbnail_url.clone();
            }
            None => self.kind = PostKind::Text,
        }
    }
}

impl Default for Post {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_name: String::new(),
            avatar_url: String::new(),
            university_id: None,
            created_at: Utc::now(),
            relative_time: String::new(),
            content: String::new(),
            tag: None,
            kind: PostKind::Text,
            image_url: None,
            video_url: None,
            video_thumbnail_url: None,
            media: Vec::new(),
            like_count: 0,
            comment_count: 0,
            viewer_has_liked: false,
        }
    }
}

/// Sponsored content, pooled independently of posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub link_url: String,
}

/// One element of the composed feed window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "itemType", rename_all = "camelCase")]
pub enum FeedItem {
    Post(Post),
    Ad(Ad),
}

impl FeedItem {
    pub fn as_post(&self) -> Option<&Post> {
        match self {
            FeedItem::Post(post) => Some(post),
            FeedItem::Ad(_) => None,
        }
    }

    pub fn is_ad(&self) -> bool {
        matches!(self, FeedItem::Ad(_))
    }
}

/// Where the current window's content came from.
///
/// `Fallback` marks opt-in sample content so an empty-but-real feed is
/// distinguishable from substitute content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Remote,
    Fallback,
}

/// Raw media record as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMedia {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Raw post record as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub university_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub media: Vec<RemoteMedia>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub is_liked: bool,
}

/// One server page; ephemeral, rebuilt on every fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub posts: Vec<RemotePost>,
}

/// Filter state driving refetches.
///
/// Only the first selected tag and first selected university are honored by
/// the remote contract; everything else is applied client-side to the
/// already-fetched window. The server's has_more/total_pages therefore
/// reflect server-side filtering only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPredicate {
    #[serde(default)]
    pub post_kinds: Vec<PostKind>,
    #[serde(default)]
    pub tags: Vec<PostTag>,
    #[serde(default)]
    pub university_ids: Vec<Uuid>,
}

impl FilterPredicate {
    /// The portion of the predicate the remote contract accepts
    pub fn server_params(&self) -> (Option<Uuid>, Option<PostTag>) {
        (
            self.university_ids.first().copied(),
            self.tags.first().copied(),
        )
    }

    /// Client-side check applied to the fetched window
    pub fn matches(&self, post: &Post) -> bool {
        if !self.post_kinds.is_empty() && !self.post_kinds.contains(&post.kind) {
            return false;
        }
        if !self.tags.is_empty() {
            match post.tag {
                Some(tag) if self.tags.contains(&tag) => {}
                _ => return false,
            }
        }
        if !self.university_ids.is_empty() {
            match post.university_id {
                Some(id) if self.university_ids.contains(&id) => {}
                _ => return false,
            }
        }
        true
    }
}

/// The authenticated actor; mutations fail fast without one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub user_id: Uuid,
    pub display_name: String,
}

/// The value published to subscribers on every state change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    pub is_loading: bool,
    pub has_more: bool,
    /// Retryable banner state for the last pagination failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source: DataSource,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            has_more: true,
            error: None,
            source: DataSource::Remote,
        }
    }
}
