//! Feed synchronization and optimistic interaction engine.
//!
//! Merges server-paginated content with locally originated actions (likes,
//! post create/edit/delete, attachment uploads) into one consistent
//! in-memory view: pagination cursoring, optimistic updates with rollback,
//! duplicate-submission guards, filter-driven refetch with stale-response
//! discarding, and deterministic ad interleaving. The network transport is
//! a collaborator behind the [`FeedService`] trait; nothing here touches a
//! socket or a disk.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod service;
pub mod services;
pub mod store;

pub use config::EngineConfig;
pub use engine::FeedEngine;
pub use error::{FeedError, Result};
pub use models::{
    Ad, DataSource, FeedItem, FeedPage, FeedSnapshot, FilterPredicate, MediaAttachment,
    MediaKind, Post, PostKind, PostTag, RemoteMedia, RemotePost, Viewer,
};
pub use service::{
    CreatePostRequest, FeedService, LikeOutcome, MediaUpload, ProgressFn, UpdatePostRequest,
};
pub use services::{LikeCoordinator, LikeToggleState, MutationPipeline, PaginationCursor,
    RequestSequence, ToggleOutcome, UploadProgressFn};
pub use store::FeedStore;
