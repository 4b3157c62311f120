//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `cms.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub logo: String,

    // URL
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Date format (date-fns tokens: dd, MMM, yyyy...)
    pub date_format: String,

    /// Seconds a rendered published page is reused; 0 disables caching
    pub revalidate_secs: u64,

    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            logo: "/spacetraveling.svg".to_string(),

            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            date_format: "dd MMM yyyy".to_string(),

            revalidate_secs: 60 * 30,

            cms: CmsConfig::default(),
            listing: ListingConfig::default(),
            reading: ReadingConfig::default(),
            comments: CommentsConfig::default(),
            preview: PreviewConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            tracing::debug!("Using CMS endpoint from {}", ENDPOINT_ENV);
            self.cms.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            tracing::debug!("Using CMS access token from {}", ACCESS_TOKEN_ENV);
            self.cms.access_token = Some(token);
        }
    }
}

/// Headless CMS connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type of blog posts
    pub document_type: String,
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "post".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Home page listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { page_size: 2 }
    }
}

/// Reading-time estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: crate::content::WORDS_PER_MINUTE,
        }
    }
}

/// utterances comment widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            repo: "gbelther/blog-show".to_string(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

/// Preview session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub cookie_name: String,
    pub session_minutes: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cookie_name: "io.prismic.preview".to_string(),
            session_minutes: 30,
        }
    }
}

/// HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.listing.page_size, 2);
        assert_eq!(config.reading.words_per_minute, 200);
        assert_eq!(config.cms.document_type, "post");
        assert_eq!(config.revalidate_secs, 1800);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Blog-show
language: en
cms:
  endpoint: https://blog-show.cdn.prismic.io/api/v2
listing:
  page_size: 5
comments:
  enable: false
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Blog-show");
        assert_eq!(config.language, "en");
        assert_eq!(config.cms.endpoint, "https://blog-show.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.timeout_secs, 10);
        assert_eq!(config.listing.page_size, 5);
        assert!(!config.comments.enable);
        assert_eq!(config.comments.repo, "gbelther/blog-show");
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = SiteConfig::default();
        config.apply_overrides(Some(String::new()), Some("token".to_string()));
        assert_eq!(config.cms.endpoint, CmsConfig::default().endpoint);
        assert_eq!(config.cms.access_token.as_deref(), Some("token"));
    }
}
