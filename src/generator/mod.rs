//! Generator module - renders blog pages with the built-in Tera templates
//!
//! The same renderer backs the live server and the static export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::{reading_time_at, ListingPage, NavPost, Neighbors, Post, PostSummary};
use crate::helpers::{date_xml, format_date, url_for};
use crate::i18n::I18n;
use crate::templates::{
    BannerView, BlockView, CommentsData, ConfigData, ListingView, NavData, NavLink, PostCard,
    PostView, TemplateRenderer,
};
use crate::Blog;

/// A post page ready to be written: the post and its neighbors
#[derive(Debug, Clone)]
pub struct PostPage {
    pub post: Post,
    pub neighbors: Neighbors,
}

/// Everything fetched from the CMS for a static export
#[derive(Debug, Clone, Default)]
pub struct Export {
    /// Listing pages in fetch order; the first one becomes `index.html`
    pub pages: Vec<ListingPage>,
    pub posts: Vec<PostPage>,
}

/// Page renderer using Tera templates
pub struct Generator {
    config: SiteConfig,
    renderer: TemplateRenderer,
    i18n: I18n,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let mut i18n = I18n::new(&blog.config.language);
        i18n.load_languages(blog.base_dir.join("languages"))?;

        Ok(Self {
            config: blog.config.clone(),
            renderer,
            i18n,
        })
    }

    /// Listing card for a post summary
    pub fn card(&self, summary: &PostSummary) -> PostCard {
        PostCard {
            uid: summary.uid.clone(),
            href: url_for(&self.config.root, &summary.path()),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: self.display_date(summary.first_publication_date.as_ref()),
            datetime: summary.first_publication_date.as_ref().map(date_xml),
        }
    }

    /// Listing view of `posts`, linking to `next_page` when there is more
    pub fn listing_view(&self, posts: &[PostSummary], next_page: Option<String>) -> ListingView {
        ListingView {
            results: posts.iter().map(|p| self.card(p)).collect(),
            next_page,
        }
    }

    /// Render the home page
    pub fn render_home(&self, listing: &ListingView, preview: bool) -> Result<String> {
        let mut context = self.create_base_context(preview);
        context.insert("listing", listing);
        self.renderer.render("index.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &Post, neighbors: &Neighbors, preview: bool) -> Result<String> {
        let mut context = self.create_base_context(preview);
        context.insert("post", &self.post_view(post));
        context.insert(
            "nav",
            &NavData {
                prev: neighbors.prev.as_ref().map(|p| self.nav_link(p)),
                next: neighbors.next.as_ref().map(|p| self.nav_link(p)),
            },
        );
        self.renderer.render("post.html", &context)
    }

    /// Render the "not found" page
    pub fn render_not_found(&self, preview: bool) -> Result<String> {
        let context = self.create_base_context(preview);
        self.renderer.render("not_found.html", &context)
    }

    /// Render the page shown when the CMS cannot be reached
    pub fn render_error(&self, retry_url: &str, preview: bool) -> Result<String> {
        let mut context = self.create_base_context(preview);
        context.insert("retry_url", retry_url);
        self.renderer.render("error.html", &context)
    }

    /// Static listing page URL; the first page is the home page itself
    pub fn static_page_url(&self, page: usize) -> String {
        if page <= 1 {
            url_for(&self.config.root, "/")
        } else {
            url_for(&self.config.root, &format!("page/{}.json", page))
        }
    }

    /// Write the whole site to `public_dir`
    pub fn generate(&self, export: &Export, public_dir: &Path, static_dir: &Path) -> Result<()> {
        fs::create_dir_all(public_dir)?;

        self.copy_static_assets(static_dir, public_dir)?;
        self.generate_listing_pages(&export.pages, public_dir)?;
        self.generate_post_pages(&export.posts, public_dir)?;

        let not_found = self.render_not_found(false)?;
        write_file(&public_dir.join("404.html"), &not_found)?;

        Ok(())
    }

    /// `index.html` plus one JSON file per later page
    fn generate_listing_pages(&self, pages: &[ListingPage], public_dir: &Path) -> Result<()> {
        let total = pages.len().max(1);
        let next_url = |page: usize| (page < total).then(|| self.static_page_url(page + 1));

        let first = pages.first().map(|p| p.posts.as_slice()).unwrap_or(&[]);
        let home = self.listing_view(first, next_url(1));
        write_file(&public_dir.join("index.html"), &self.render_home(&home, false)?)?;

        for (i, page) in pages.iter().enumerate().skip(1) {
            let number = i + 1;
            let view = self.listing_view(&page.posts, next_url(number));
            let output_path = public_dir.join("page").join(format!("{}.json", number));
            write_file(&output_path, &serde_json::to_string(&view)?)?;
        }

        tracing::info!("Generated {} listing pages", total);
        Ok(())
    }

    fn generate_post_pages(&self, posts: &[PostPage], public_dir: &Path) -> Result<()> {
        let mut written = 0;
        for page in posts {
            let uid = &page.post.uid;
            if !is_path_segment(uid) {
                tracing::warn!("Skipping post with unsafe uid {:?}", uid);
                continue;
            }
            let html = self.render_post(&page.post, &page.neighbors, false)?;
            let output_path = public_dir.join("post").join(uid).join("index.html");
            write_file(&output_path, &html)?;
            written += 1;
        }

        tracing::info!("Generated {} posts", written);
        Ok(())
    }

    /// Copy the site's static files (logo, styles...) into public/
    fn copy_static_assets(&self, static_dir: &Path, public_dir: &Path) -> Result<()> {
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }

    fn build_config_data(&self) -> ConfigData {
        let comments = &self.config.comments;
        ConfigData {
            title: self.config.title.clone(),
            language: self.config.language.clone(),
            home_url: url_for(&self.config.root, "/"),
            logo_url: url_for(&self.config.root, &self.config.logo),
            exit_preview_url: url_for(&self.config.root, "api/exit-preview"),
            comments: (comments.enable && !comments.repo.is_empty()).then(|| CommentsData {
                repo: comments.repo.clone(),
                issue_term: comments.issue_term.clone(),
                theme: comments.theme.clone(),
            }),
        }
    }

    fn create_base_context(&self, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("config", &self.build_config_data());
        context.insert("t", &self.i18n.get_all_translations());
        context.insert("preview", &preview);
        context
    }

    fn post_view(&self, post: &Post) -> PostView {
        let minutes = reading_time_at(&post.content, self.config.reading.words_per_minute);

        PostView {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: self.display_date(post.first_publication_date.as_ref()),
            datetime: post.first_publication_date.as_ref().map(date_xml),
            reading_time: self.i18n.get_count("reading_time", minutes),
            banner: post.banner.as_ref().map(|b| BannerView {
                url: b.url.clone(),
                alt: b.alt.clone().unwrap_or_else(|| post.title.clone()),
            }),
            blocks: post
                .content
                .iter()
                .map(|block| BlockView {
                    heading: block.heading.clone(),
                    html: block.body_html(),
                })
                .collect(),
        }
    }

    fn nav_link(&self, post: &NavPost) -> NavLink {
        NavLink {
            title: post.title.clone(),
            path: url_for(&self.config.root, &post.path()),
        }
    }

    fn display_date(&self, date: Option<&DateTime<Utc>>) -> String {
        match date {
            Some(date) => format_date(date, &self.config.date_format, &self.i18n),
            None => self.i18n.get("unpublished"),
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, content).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))?;
    tracing::debug!("Generated: {:?}", path);
    Ok(())
}

/// A uid can only become a single directory name under `post/`
fn is_path_segment(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\', ':', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{Cursor, InMemoryCms};
    use crate::content::{Banner, ContentBlock, RichTextNode};
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn generator(config: SiteConfig) -> (Generator, TempDir) {
        let dir = TempDir::new().unwrap();
        let blog = Blog::from_parts(config, dir.path(), Arc::new(InMemoryCms::default()));
        (Generator::new(&blog).unwrap(), dir)
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()),
            title: title.to_string(),
            subtitle: Some("Pensando em sincronização".to_string()),
            author: "Joseph Oliveira".to_string(),
        }
    }

    fn post(words: usize) -> Post {
        let body = vec!["palavra"; words].join(" ");
        Post {
            id: "YF1".to_string(),
            uid: "como-utilizar-hooks".to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()),
            last_publication_date: None,
            title: "Como utilizar <Hooks>".to_string(),
            subtitle: None,
            author: "Joseph Oliveira".to_string(),
            banner: Some(Banner {
                url: "https://images.prismic.io/banner.png".to_string(),
                alt: None,
            }),
            content: vec![ContentBlock {
                heading: String::new(),
                body: vec![RichTextNode::paragraph(body)],
            }],
        }
    }

    #[test]
    fn test_card() {
        let (generator, _dir) = generator(SiteConfig::default());
        let card = generator.card(&summary("hello-world", "Hello"));
        assert_eq!(card.href, "/post/hello-world");
        assert_eq!(card.date, "15 mar 2021");
        assert_eq!(card.datetime.as_deref(), Some("2021-03-15T19:25:28+00:00"));

        let mut draft = summary("draft", "Draft");
        draft.first_publication_date = None;
        assert_eq!(generator.card(&draft).date, "Não publicado");
    }

    #[test]
    fn test_home_shows_load_more_only_with_next_page() {
        let (generator, _dir) = generator(SiteConfig::default());
        let posts = vec![summary("a", "Post A"), summary("b", "Post B")];

        let more = generator.listing_view(&posts, Some("/api/posts?page=C1".to_string()));
        let html = generator.render_home(&more, false).unwrap();
        assert!(html.contains("Post A"));
        assert!(html.find("Post A") < html.find("Post B"));
        assert!(html.contains(r#"data-next-page="/api/posts?page=C1""#));
        assert!(html.contains("load-more-error"));

        let last = generator.listing_view(&posts, None);
        let html = generator.render_home(&last, false).unwrap();
        assert!(!html.contains("id=\"load-more\""));
    }

    #[test]
    fn test_empty_home() {
        let (generator, _dir) = generator(SiteConfig::default());
        let html = generator
            .render_home(&generator.listing_view(&[], None), false)
            .unwrap();
        assert!(!html.contains("class=\"post\""));
        assert!(!html.contains("id=\"load-more\""));
    }

    #[test]
    fn test_post_page() {
        let (generator, _dir) = generator(SiteConfig::default());
        let neighbors = Neighbors {
            prev: Some(NavPost {
                title: "Older".to_string(),
                uid: "older".to_string(),
            }),
            next: None,
        };
        let html = generator.render_post(&post(201), &neighbors, false).unwrap();

        assert!(html.contains("Como utilizar &lt;Hooks&gt;"));
        assert!(html.contains("2 min"));
        assert!(html.contains(r#"src="https://images.prismic.io/banner.png""#));
        assert!(html.contains(r#"href="/post/older""#));
        assert!(html.contains("Post anterior"));
        assert!(!html.contains("Próximo post"));
        assert!(html.contains("inject-comments-for-uterances"));
        assert!(html.contains(r#"repo="gbelther/blog-show""#));
        assert!(!html.contains("api/exit-preview"));
    }

    #[test]
    fn test_post_page_without_optional_parts() {
        let mut config = SiteConfig::default();
        config.comments.enable = false;
        let (generator, _dir) = generator(config);

        let mut bare = post(0);
        bare.banner = None;
        bare.first_publication_date = None;
        let html = generator
            .render_post(&bare, &Neighbors::default(), true)
            .unwrap();

        assert!(!html.contains("class=\"banner\""));
        assert!(!html.contains("class=\"neighbors\""));
        assert!(!html.contains("utteranc.es"));
        assert!(html.contains("0 min"));
        assert!(html.contains(r#"href="/api/exit-preview""#));
    }

    #[test]
    fn test_english_site() {
        let mut config = SiteConfig::default();
        config.language = "en".to_string();
        let (generator, _dir) = generator(config);
        let html = generator.render_not_found(false).unwrap();
        assert!(html.contains("Post not found"));
        assert!(html.contains(r#"lang="en""#));
    }

    #[test]
    fn test_generate_static_site() {
        let (generator, dir) = generator(SiteConfig::default());
        let static_dir = dir.path().join("static");
        fs::create_dir_all(static_dir.join("img")).unwrap();
        fs::write(static_dir.join("img/logo.svg"), "<svg/>").unwrap();

        let export = Export {
            pages: vec![
                ListingPage {
                    posts: vec![summary("a", "A"), summary("b", "B")],
                    next_page: Cursor::new("C1"),
                },
                ListingPage {
                    posts: vec![summary("c", "C")],
                    next_page: None,
                },
            ],
            posts: vec![PostPage {
                post: post(10),
                neighbors: Neighbors::default(),
            }],
        };
        let public_dir = dir.path().join("public");
        generator.generate(&export, &public_dir, &static_dir).unwrap();

        let index = fs::read_to_string(public_dir.join("index.html")).unwrap();
        assert!(index.contains(r#"data-next-page="/page/2.json""#));

        let page: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(public_dir.join("page/2.json")).unwrap())
                .unwrap();
        assert_eq!(page["results"][0]["uid"], "c");
        assert!(page["next_page"].is_null());

        assert!(public_dir.join("post/como-utilizar-hooks/index.html").exists());
        assert!(public_dir.join("404.html").exists());
        assert!(public_dir.join("img/logo.svg").exists());
    }

    #[test]
    fn test_unsafe_uids_are_not_written() {
        assert!(is_path_segment("como-utilizar-hooks"));
        for uid in ["", ".", "..", "../escape", "a/b", "a\\b", "C:evil"] {
            assert!(!is_path_segment(uid), "{:?}", uid);
        }

        let (generator, dir) = generator(SiteConfig::default());
        let mut escaping = post(10);
        escaping.uid = "../../outside".to_string();
        let export = Export {
            pages: Vec::new(),
            posts: vec![
                PostPage {
                    post: escaping,
                    neighbors: Neighbors::default(),
                },
                PostPage {
                    post: post(10),
                    neighbors: Neighbors::default(),
                },
            ],
        };
        let public_dir = dir.path().join("site").join("public");
        generator
            .generate(&export, &public_dir, &dir.path().join("static"))
            .unwrap();

        assert!(public_dir.join("post/como-utilizar-hooks/index.html").exists());
        assert!(!dir.path().join("outside").exists());
        assert!(!dir.path().join("site/outside").exists());
    }
}
