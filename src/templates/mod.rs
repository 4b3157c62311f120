//! Built-in blog templates using the Tera template engine
//!
//! All templates are embedded directly in the binary. Content coming from
//! the CMS is escaped; only the rich text bodies, rendered by
//! [`crate::content::richtext`], are marked safe.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::helpers::escape_html;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Escape CMS text but leave URL slashes readable
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("error.html", include_str!("site/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/comments.html",
                include_str!("site/partials/comments.html"),
            ),
            (
                "partials/preview_button.html",
                include_str!("site/partials/preview_button.html"),
            ),
            (
                "partials/load_more.html",
                include_str!("site/partials/load_more.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub language: String,
    pub home_url: String,
    pub logo_url: String,
    pub exit_preview_url: String,
    pub comments: Option<CommentsData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsData {
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

/// A post on the listing; also the JSON shape of "load more" pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub date: String,
    pub datetime: Option<String>,
}

/// A listing page: the cards plus the URL of the next page, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub results: Vec<PostCard>,
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub date: String,
    pub datetime: Option<String>,
    pub reading_time: String,
    pub banner: Option<BannerView>,
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerView {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NavData {
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
}
