//! Previous/next post resolution

use serde::Serialize;

use super::post::{NavPost, Post};
use crate::cms::{
    self, ContentApi, Direction, Ordering, Predicate, PreviewRef, Query, ResultPage,
    DOCUMENT_ID, DOCUMENT_TYPE, FIRST_PUBLICATION_DATE,
};

/// The posts published right before and right after the current one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Neighbors {
    /// Older post
    pub prev: Option<NavPost>,
    /// Newer post
    pub next: Option<NavPost>,
}

/// Look up both neighbors of `current` by publication date.
///
/// The two single-result queries are independent and run concurrently.
pub async fn resolve_neighbors(
    api: &dyn ContentApi,
    doc_type: &str,
    current: &Post,
    preview: Option<&PreviewRef>,
) -> cms::Result<Neighbors> {
    let older = neighbor_query(doc_type, &current.id, Direction::Desc);
    let newer = neighbor_query(doc_type, &current.id, Direction::Asc);

    let (prev, next) = tokio::join!(api.query(&older, preview), api.query(&newer, preview));

    Ok(Neighbors {
        prev: pick_neighbor(prev?, current),
        next: pick_neighbor(next?, current),
    })
}

fn neighbor_query(doc_type: &str, id: &str, direction: Direction) -> Query {
    Query::new()
        .predicate(Predicate::at(DOCUMENT_TYPE, doc_type))
        .predicate(Predicate::not(DOCUMENT_ID, id))
        .fetch(format!("{}.title", doc_type))
        .order_by(Ordering {
            field: FIRST_PUBLICATION_DATE.to_string(),
            direction,
        })
        .after(id)
        .page_size(1)
}

/// First result, unless the API handed back the current post itself
fn pick_neighbor(page: ResultPage, current: &Post) -> Option<NavPost> {
    let doc = page.results.into_iter().next()?;
    if doc.id == current.id || doc.uid.as_deref() == Some(current.uid.as_str()) {
        return None;
    }
    NavPost::from_document(&doc)
}
