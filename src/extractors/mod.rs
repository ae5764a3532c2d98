use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod instagram;
pub mod shortcode;

pub use instagram::InstagramResolver;
pub use shortcode::{PostKind, PostReference};

use crate::Result;

/// A direct, time-limited link to the video behind a post
///
/// Links issued by the platform's CDN expire quickly, so a resource is used once and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResource {
    /// Signed CDN URL of the video
    pub direct_url: String,

    /// Always true; only video posts produce a resource
    pub is_video: bool,
}

impl MediaResource {
    pub fn video(direct_url: impl Into<String>) -> Self {
        Self {
            direct_url: direct_url.into(),
            is_video: true,
        }
    }
}

/// Trait for resolving a validated post into its direct media URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Fetch the post's metadata and return its direct video URL
    async fn resolve(&self, post: &PostReference) -> Result<MediaResource>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}
