use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{MediaResolver, MediaResource, PostReference};
use crate::config::InstagramConfig;
use crate::{Result, TranscriptorError};

/// GraphQL envelope returned by the public web endpoint
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    #[serde(alias = "shortcode_media")]
    xdt_shortcode_media: Option<ShortcodeMedia>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl GraphQlResponse {
    /// Error text reported by the platform, if any
    fn platform_message(&self) -> Option<String> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Some(messages.join("; "));
        }
        self.message.clone().filter(|m| !m.trim().is_empty())
    }
}

/// The subset of post metadata needed to locate the video
#[derive(Debug, Deserialize)]
struct ShortcodeMedia {
    #[serde(rename = "__typename")]
    typename: Option<String>,
    #[serde(default)]
    is_video: bool,
    video_url: Option<String>,
}

/// Instagram resolver using anonymous GraphQL metadata lookups
pub struct InstagramResolver {
    endpoint: Url,
    app_id: String,
    doc_id: String,
    user_agent: String,
    timeout: Duration,
}

impl InstagramResolver {
    pub fn new(config: &InstagramConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("graphql/query"))
            .map_err(|e| TranscriptorError::ResolverInternal(format!("invalid base URL: {}", e)))?;

        Ok(Self {
            endpoint,
            app_id: config.app_id.clone(),
            doc_id: config.doc_id.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// A fresh HTTP session, owned by a single resolve call
    fn session(&self) -> Result<Client> {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .build()
            .map_err(|e| TranscriptorError::ResolverInternal(e.to_string()))
    }

    /// Fetch post metadata for a shortcode
    async fn fetch_metadata(&self, shortcode: &str) -> Result<ShortcodeMedia> {
        tracing::debug!("Fetching post metadata for shortcode: {}", shortcode);

        let variables = serde_json::json!({ "shortcode": shortcode }).to_string();

        let response = self
            .session()?
            .post(self.endpoint.clone())
            .header("X-IG-App-ID", &self.app_id)
            .form(&[("variables", variables.as_str()), ("doc_id", self.doc_id.as_str())])
            .send()
            .await
            .map_err(|e| TranscriptorError::PostFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptorError::PostFetchFailed(http_error_detail(status, &body)));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| TranscriptorError::ResolverInternal(format!("unreadable metadata response: {}", e)))?;

        if !body.errors.is_empty() {
            let detail = body.platform_message().unwrap_or_default();
            return Err(TranscriptorError::PostFetchFailed(detail));
        }

        body.data
            .and_then(|data| data.xdt_shortcode_media)
            .ok_or_else(|| {
                let detail = body
                    .message
                    .unwrap_or_else(|| format!("post {} is unavailable or private", shortcode));
                TranscriptorError::PostFetchFailed(detail)
            })
    }
}

/// Describe a rejected request, preferring the platform's own message
fn http_error_detail(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<GraphQlResponse>(body)
        .ok()
        .and_then(|body| body.platform_message())
    {
        Some(message) => format!("{} (HTTP {})", message, status),
        None => format!("HTTP {}", status),
    }
}

/// Turn post metadata into a media resource, rejecting anything that is not a video
fn media_resource_from(media: ShortcodeMedia) -> Result<MediaResource> {
    if !media.is_video {
        tracing::debug!(
            "Post is not a video (type: {})",
            media.typename.as_deref().unwrap_or("unknown")
        );
        return Err(TranscriptorError::NotVideoContent);
    }

    match media.video_url {
        Some(url) if !url.is_empty() => Ok(MediaResource::video(url)),
        _ => Err(TranscriptorError::NoMediaUrl),
    }
}

#[async_trait]
impl MediaResolver for InstagramResolver {
    async fn resolve(&self, post: &PostReference) -> Result<MediaResource> {
        tracing::info!("Resolving Instagram {} {}", post.kind(), post.shortcode());

        let media = self.fetch_metadata(post.shortcode()).await?;
        media_resource_from(media)
    }

    fn platform_name(&self) -> &'static str {
        "Instagram"
    }
}
