//! Generate a static copy of the blog

use anyhow::Result;
use std::time::Instant;

use crate::content::{resolve_neighbors, Post, PostFeed};
use crate::generator::{Export, Generator, PostPage};
use crate::Blog;

/// Fetch all published content and write the site to `public_dir`
pub async fn run(blog: &Blog) -> Result<()> {
    let start = Instant::now();

    let export = fetch(blog).await?;
    tracing::info!(
        "Fetched {} listing pages and {} posts",
        export.pages.len(),
        export.posts.len()
    );

    let generator = Generator::new(blog)?;
    generator.generate(&export, &blog.public_dir, &blog.static_dir)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());
    Ok(())
}

/// Walk the listing to its last page, then load every post and its neighbors
pub async fn fetch(blog: &Blog) -> Result<Export> {
    let config = &blog.config;
    let doc_type = config.cms.document_type.as_str();
    let cms = blog.cms.as_ref();
    let feed = PostFeed::new(cms, doc_type, config.listing.page_size);

    let mut pages = vec![feed.load_next_page(None).await?];
    while let Some(cursor) = pages.last().and_then(|p| p.next_page.clone()) {
        pages.push(feed.load_next_page(Some(&cursor)).await?);
    }

    let mut posts = Vec::new();
    for summary in pages.iter().flat_map(|p| &p.posts) {
        let Some(doc) = cms.get_by_uid(doc_type, &summary.uid, None).await? else {
            tracing::warn!("Post {} disappeared during export, skipping", summary.uid);
            continue;
        };
        let post = Post::from_document(&doc)?;
        let neighbors = resolve_neighbors(cms, doc_type, &post, None).await?;
        posts.push(PostPage { post, neighbors });
    }

    Ok(Export { pages, posts })
}
