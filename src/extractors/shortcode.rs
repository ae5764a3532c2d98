use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::{Result, TranscriptorError};

/// Recognized post URL shapes, tried in order; the first match wins.
static POST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"instagram\.com/(p|reel|tv)/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"instagram\.com/(stories)/[^/]+/([a-zA-Z0-9_-]+)").unwrap(),
    ]
});

/// Kind of post a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Post,
    Reel,
    Tv,
    Story,
}

impl PostKind {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "p" => Some(PostKind::Post),
            "reel" => Some(PostKind::Reel),
            "tv" => Some(PostKind::Tv),
            "stories" => Some(PostKind::Story),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Post => "post",
            PostKind::Reel => "reel",
            PostKind::Tv => "tv",
            PostKind::Story => "story",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated post URL and the shortcode extracted from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReference {
    raw_url: String,
    shortcode: String,
    kind: PostKind,
}

impl PostReference {
    /// Validate a post URL and capture its shortcode
    pub fn parse(url: &str) -> Result<Self> {
        POST_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(url))
            .and_then(|caps| {
                let kind = PostKind::from_segment(caps.get(1)?.as_str())?;
                let shortcode = caps.get(2)?.as_str();
                Some(Self {
                    raw_url: url.to_string(),
                    shortcode: shortcode.to_string(),
                    kind,
                })
            })
            .ok_or_else(|| TranscriptorError::InvalidUrl(url.to_string()))
    }

    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    pub fn shortcode(&self) -> &str {
        &self.shortcode
    }

    pub fn kind(&self) -> PostKind {
        self.kind
    }
}

/// URL shapes accepted by the validator, for display
pub fn supported_formats() -> &'static [&'static str] {
    &[
        "https://www.instagram.com/p/<shortcode>/",
        "https://www.instagram.com/reel/<shortcode>/",
        "https://www.instagram.com/tv/<shortcode>/",
        "https://www.instagram.com/stories/<username>/<story id>/",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_urls() {
        let cases = [
            ("https://instagram.com/p/ABC123/", "ABC123", PostKind::Post),
            ("https://www.instagram.com/reel/XYZ789/", "XYZ789", PostKind::Reel),
            ("https://www.instagram.com/reel/C1a_b-2?igsh=abc", "C1a_b-2", PostKind::Reel),
            ("instagram.com/tv/Tv_Clip", "Tv_Clip", PostKind::Tv),
            (
                "https://www.instagram.com/stories/some.user/3141592653589793/",
                "3141592653589793",
                PostKind::Story,
            ),
        ];

        for (url, shortcode, kind) in cases {
            let post = PostReference::parse(url).expect(url);
            assert_eq!(post.shortcode(), shortcode, "wrong shortcode for {}", url);
            assert_eq!(post.kind(), kind, "wrong kind for {}", url);
            assert_eq!(post.raw_url(), url);
        }
    }

    #[test]
    fn test_rejected_urls() {
        let cases = [
            "",
            "not a url",
            "https://example.com/p/ABC123/",
            "https://www.instagram.com/",
            "https://www.instagram.com/some.user/",
            "https://www.instagram.com/p/",
            "https://www.instagram.com/stories/some.user/",
            "https://www.instagram.com/explore/tags/rust/",
        ];

        for url in cases {
            match PostReference::parse(url) {
                Err(TranscriptorError::InvalidUrl(rejected)) => assert_eq!(rejected, url),
                other => panic!("expected InvalidUrl for {:?}, got {:?}", url, other),
            }
        }
    }

    #[test]
    fn test_post_prefix_wins_over_story() {
        let post = PostReference::parse("https://instagram.com/p/First/stories/user/Second").unwrap();
        assert_eq!(post.shortcode(), "First");
        assert_eq!(post.kind(), PostKind::Post);
    }

    #[test]
    fn test_domain_match_is_literal() {
        assert!(PostReference::parse("https://INSTAGRAM.COM/p/ABC/").is_err());
    }
}
