pub mod compositor;
pub mod likes;
pub mod mutations;
pub mod normalizer;
pub mod pagination;

pub use likes::{LikeCoordinator, LikeToggleState, ToggleOutcome};
pub use mutations::{MutationPipeline, UploadProgressFn};
pub use pagination::{PaginationCursor, RequestSequence};
