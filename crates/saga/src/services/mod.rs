//! Remote collaborators driven by saga steps.

pub mod likes;

pub use likes::{
    DEFAULT_BLOG_TIMEOUT, HttpLikeRemovalClient, InMemoryLikeService, LikeRemovalService,
};
