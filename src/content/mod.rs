//! Content module - posts as the blog sees them, built from CMS documents

mod listing;
mod neighbors;
mod post;
mod reading_time;
pub mod richtext;

pub use listing::{Listing, ListingPage, PostFeed};
pub use neighbors::{resolve_neighbors, Neighbors};
pub use post::{Banner, ContentBlock, NavPost, Post, PostSummary};
pub use reading_time::{minutes_for, reading_time, reading_time_at, word_count, WORDS_PER_MINUTE};
pub use richtext::{RichTextNode, Span};
