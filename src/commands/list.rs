//! List the posts published in the CMS

use anyhow::Result;

use crate::content::{Listing, PostFeed};
use crate::Blog;

/// Print every post, following the pagination cursors to the end
pub async fn run(blog: &Blog) -> Result<()> {
    let config = &blog.config;
    let feed = PostFeed::new(
        blog.cms.as_ref(),
        &config.cms.document_type,
        config.listing.page_size,
    );

    let mut listing = Listing::first_page(&feed).await?;
    listing.load_all(&feed).await?;

    println!("Posts ({}):", listing.posts.len());
    for post in &listing.posts {
        let date = post
            .first_publication_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!("  {} - {} [{}]", date, post.title, post.uid);
    }

    Ok(())
}
