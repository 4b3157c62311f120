//! spacetraveling: a server-rendered blog backed by the Prismic headless CMS
//!
//! Posts are read through the [`cms::ContentApi`] trait and rendered with
//! embedded Tera templates, either per request by the server or once by
//! the static export.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod preview;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentApi, InMemoryCms, PrismicClient};

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
    /// Content API shared by every request
    pub cms: Arc<dyn ContentApi>,
}

impl Blog {
    /// Create a blog from a directory, reading posts from Prismic
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = load_config(base_dir.as_ref())?;
        let cms = PrismicClient::new(&config.cms)?;
        tracing::debug!("Using content API at {}", config.cms.endpoint);
        Ok(Self::from_parts(config, base_dir, Arc::new(cms)))
    }

    /// Create a blog that reads posts from a local JSON fixture
    pub fn with_fixtures<P: AsRef<Path>, F: AsRef<Path>>(base_dir: P, fixtures: F) -> Result<Self> {
        let config = load_config(base_dir.as_ref())?;
        let cms = InMemoryCms::from_file(fixtures.as_ref())?;
        tracing::info!("Serving content from fixtures {:?}", fixtures.as_ref());
        Ok(Self::from_parts(config, base_dir, Arc::new(cms)))
    }

    /// Assemble a blog from an already loaded config and content API
    pub fn from_parts<P: AsRef<Path>>(
        config: config::SiteConfig,
        base_dir: P,
        cms: Arc<dyn ContentApi>,
    ) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            cms,
        }
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

/// `_config.yml` if present, with environment overrides applied
fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
    let config_path = base_dir.join("_config.yml");

    let mut config = if config_path.exists() {
        config::SiteConfig::load(&config_path)?
    } else {
        config::SiteConfig::default()
    };
    config.apply_env();

    Ok(config)
}
