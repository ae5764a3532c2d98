use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::utils::{mask_secret, non_empty};

/// Environment variable holding the AssemblyAI credential
pub const API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AssemblyAI configuration
    pub assemblyai: AssemblyAiConfig,

    /// Instagram metadata endpoint configuration
    pub instagram: InstagramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyAiConfig {
    /// API base URL
    pub base_url: String,

    /// API key (overridden by ASSEMBLYAI_API_KEY)
    pub api_key: Option<String>,

    /// Seconds between job status checks
    pub poll_interval_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstagramConfig {
    /// Web base URL serving the GraphQL endpoint
    pub base_url: String,

    /// Value of the X-IG-App-ID header sent by the public web client
    pub app_id: String,

    /// Persisted GraphQL query document for shortcode lookups
    pub doc_id: String,

    /// Browser user agent for anonymous requests
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for AssemblyAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com".to_string(),
            api_key: None,
            poll_interval_secs: 3.0,
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            app_id: "936619743392459".to_string(),
            doc_id: "8845758582119845".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path)
                    .context("Failed to read config file")?;
                Self::from_yaml(&content)?
            }
            _ => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Override file values with ASSEMBLYAI_API_KEY when it is set
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.set_api_key(Some(&key));
        }
    }

    /// Replace the process-wide API key; empty values are ignored
    pub fn set_api_key(&mut self, key: Option<&str>) {
        if let Some(key) = non_empty(key) {
            self.assemblyai.api_key = Some(key.to_string());
        }
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("social-transcriptor").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.assemblyai.base_url)
            .with_context(|| format!("Invalid AssemblyAI base URL: {}", self.assemblyai.base_url))?;
        Url::parse(&self.instagram.base_url)
            .with_context(|| format!("Invalid Instagram base URL: {}", self.instagram.base_url))?;

        if !(self.assemblyai.poll_interval_secs.is_finite() && self.assemblyai.poll_interval_secs > 0.0) {
            anyhow::bail!("assemblyai.poll_interval_secs must be a positive number");
        }

        Ok(())
    }

    /// Configured API key, if any
    pub fn api_key(&self) -> Option<&str> {
        non_empty(self.assemblyai.api_key.as_deref())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  AssemblyAI URL: {}", self.assemblyai.base_url);
        println!(
            "  AssemblyAI Key: {}",
            self.api_key().map(mask_secret).unwrap_or_else(|| "(not set)".to_string())
        );
        println!("  Poll Interval: {}s", self.assemblyai.poll_interval_secs);
        println!("  Instagram URL: {}", self.instagram.base_url);
        println!("  Request Timeout: {}s", self.instagram.request_timeout_secs);
        if let Some(path) = Self::config_path() {
            println!("  Config File: {}", path.display());
        }
    }
}
