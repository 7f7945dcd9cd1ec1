//! The network collaborator seam.
//!
//! `FeedService` abstracts the remote feed API; the engine never talks to a
//! transport directly. Production wires an HTTP/gRPC client behind this
//! trait, tests wire an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{FeedPage, MediaAttachment, MediaKind, PostTag, RemotePost};

/// Per-file upload progress callback (0..=100)
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// A locally selected file queued for upload
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub kind: MediaKind,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<PostTag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<PostTag>,
}

/// Authoritative like state as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: u32,
}

#[async_trait]
pub trait FeedService: Send + Sync {
    /// List one server page. Only a single university and a single tag are
    /// honored by the remote contract.
    async fn list_posts(
        &self,
        page: u32,
        page_size: u32,
        university_id: Option<Uuid>,
        tag: Option<PostTag>,
    ) -> Result<FeedPage>;

    async fn create_post(&self, req: CreatePostRequest) -> Result<RemotePost>;

    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> Result<RemotePost>;

    async fn delete_post(&self, id: Uuid) -> Result<()>;

    async fn get_post(&self, id: Uuid) -> Result<RemotePost>;

    async fn toggle_like(&self, id: Uuid) -> Result<LikeOutcome>;

    async fn upload_media(
        &self,
        post_id: Uuid,
        file: &MediaUpload,
        progress: ProgressFn,
    ) -> Result<MediaAttachment>;
}
