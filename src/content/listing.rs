//! Home page listing with incremental "load more" pagination

use serde::Serialize;

use super::post::PostSummary;
use crate::cms::{
    self, ContentApi, Cursor, Ordering, Predicate, PreviewRef, Query, ResultPage, DOCUMENT_TYPE,
    FIRST_PUBLICATION_DATE,
};

/// One fetched page of the listing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingPage {
    pub posts: Vec<PostSummary>,
    pub next_page: Option<Cursor>,
}

impl ListingPage {
    /// Project API results; documents that cannot be linked to are skipped
    pub fn from_results(page: ResultPage) -> Self {
        let posts = page
            .results
            .iter()
            .filter_map(|doc| match PostSummary::from_document(doc) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!("Skipping document {} in listing: {}", doc.id, e);
                    None
                }
            })
            .collect();

        Self {
            posts,
            next_page: page.next_page,
        }
    }
}

/// Where listing pages come from
#[derive(Clone, Copy)]
pub struct PostFeed<'a> {
    pub api: &'a dyn ContentApi,
    pub doc_type: &'a str,
    pub page_size: usize,
    pub preview: Option<&'a PreviewRef>,
}

impl<'a> PostFeed<'a> {
    pub fn new(api: &'a dyn ContentApi, doc_type: &'a str, page_size: usize) -> Self {
        Self {
            api,
            doc_type,
            page_size,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: Option<&'a PreviewRef>) -> Self {
        self.preview = preview;
        self
    }

    /// Newest first, projected to the listing fields
    pub fn first_page_query(&self) -> Query {
        Query::new()
            .predicate(Predicate::at(DOCUMENT_TYPE, self.doc_type))
            .fetch(format!("{}.title", self.doc_type))
            .fetch(format!("{}.subtitle", self.doc_type))
            .fetch(format!("{}.author", self.doc_type))
            .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
            .page_size(self.page_size)
    }

    /// Fetch the page at `cursor`, or the first page when there is none
    pub async fn load_next_page(&self, cursor: Option<&Cursor>) -> cms::Result<ListingPage> {
        let page = match cursor {
            Some(cursor) => self.api.next_page(cursor, self.preview).await?,
            None => self.api.query(&self.first_page_query(), self.preview).await?,
        };
        Ok(ListingPage::from_results(page))
    }

    /// Fetch page `number` (1-based) by re-running the listing search
    pub async fn load_page(&self, number: usize) -> cms::Result<ListingPage> {
        let query = self.first_page_query().page(number);
        let page = self.api.query(&query, self.preview).await?;
        Ok(ListingPage::from_results(page))
    }
}

/// The posts displayed so far, in fetch order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Listing {
    pub posts: Vec<PostSummary>,
    pub next_page: Option<Cursor>,
}

impl Listing {
    /// Load the first page
    pub async fn first_page(feed: &PostFeed<'_>) -> cms::Result<Self> {
        let page = feed.load_next_page(None).await?;
        Ok(Self {
            posts: page.posts,
            next_page: page.next_page,
        })
    }

    /// Whether the "load more" control should be shown
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a page after the posts already listed
    pub fn append(&mut self, page: ListingPage) {
        self.posts.extend(page.posts);
        self.next_page = page.next_page;
    }

    /// Fetch and append the next page.
    ///
    /// Returns how many posts were added. On error the listing is left as
    /// it was, so the same call can be retried.
    pub async fn load_more(&mut self, feed: &PostFeed<'_>) -> cms::Result<usize> {
        let Some(cursor) = self.next_page.as_ref() else {
            return Ok(0);
        };
        let page = feed.load_next_page(Some(cursor)).await?;
        let added = page.posts.len();
        self.append(page);
        Ok(added)
    }

    /// Keep loading until the API reports no more pages
    pub async fn load_all(&mut self, feed: &PostFeed<'_>) -> cms::Result<()> {
        while self.has_more() {
            self.load_more(feed).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{CmsError, Document, InMemoryCms};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

    fn post_doc(uid: &str, day: u32) -> Document {
        Document {
            id: uid.to_uppercase(),
            uid: Some(uid.to_string()),
            doc_type: "post".to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, day, 12, 0, 0).unwrap()),
            last_publication_date: None,
            data: json!({ "title": uid, "subtitle": "sub", "author": "Ana", "content": [] }),
        }
    }

    fn uids(listing: &Listing) -> Vec<&str> {
        listing.posts.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_more_concatenates_pages() {
        let cms = InMemoryCms::new(vec![
            post_doc("d", 1),
            post_doc("c", 2),
            post_doc("b", 3),
            post_doc("a", 4),
        ]);
        let feed = PostFeed::new(&cms, "post", 2);

        let mut listing = Listing::first_page(&feed).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b"]);
        assert!(listing.has_more());

        let added = listing.load_more(&feed).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(uids(&listing), vec!["a", "b", "c", "d"]);
        assert!(!listing.has_more());

        assert_eq!(listing.load_more(&feed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let cms = InMemoryCms::default();
        let listing = Listing::first_page(&PostFeed::new(&cms, "post", 2))
            .await
            .unwrap();
        assert!(listing.posts.is_empty());
        assert!(!listing.has_more());
    }

    #[tokio::test]
    async fn test_load_all() {
        let docs = (1..=5).map(|d| post_doc(&format!("p{}", d), d)).collect();
        let cms = InMemoryCms::new(docs);
        let feed = PostFeed::new(&cms, "post", 2);
        let mut listing = Listing::first_page(&feed).await.unwrap();
        listing.load_all(&feed).await.unwrap();
        assert_eq!(uids(&listing), vec!["p5", "p4", "p3", "p2", "p1"]);
    }

    #[tokio::test]
    async fn test_load_page_by_number() {
        let docs = (1..=5).map(|d| post_doc(&format!("p{}", d), d)).collect();
        let cms = InMemoryCms::new(docs);
        let feed = PostFeed::new(&cms, "post", 2);

        let second = feed.load_page(2).await.unwrap();
        let second_uids: Vec<&str> = second.posts.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(second_uids, vec!["p3", "p2"]);
        assert!(second.next_page.is_some());

        let last = feed.load_page(3).await.unwrap();
        assert_eq!(last.posts.len(), 1);
        assert!(last.next_page.is_none());
        assert_eq!(feed.load_page(1).await.unwrap(), feed.load_next_page(None).await.unwrap());
    }

    /// Scripted API: first page [A, B] with cursor C1, then [C, D] with an
    /// empty cursor. Fails the next-page call while `fail` is set.
    struct ScriptedApi {
        fail: AtomicBool,
    }

    #[async_trait]
    impl ContentApi for ScriptedApi {
        async fn query(&self, _: &Query, _: Option<&PreviewRef>) -> cms::Result<ResultPage> {
            Ok(ResultPage {
                results: vec![post_doc("a", 4), post_doc("b", 3)],
                next_page: Cursor::new("C1"),
            })
        }

        async fn next_page(&self, cursor: &Cursor, _: Option<&PreviewRef>) -> cms::Result<ResultPage> {
            if self.fail.load(AtomicOrdering::SeqCst) {
                return Err(CmsError::Server {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            assert_eq!(cursor.as_str(), "C1");
            let page: ResultPage = serde_json::from_value(json!({
                "next_page": "",
                "results": [
                    serde_json::to_value(post_doc("c", 2)).unwrap(),
                    serde_json::to_value(post_doc("d", 1)).unwrap()
                ]
            }))
            .unwrap();
            Ok(page)
        }
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_listing_and_can_retry() {
        let api = ScriptedApi {
            fail: AtomicBool::new(true),
        };
        let feed = PostFeed::new(&api, "post", 2);
        let mut listing = Listing::first_page(&feed).await.unwrap();
        let before = listing.clone();

        let err = listing.load_more(&feed).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(listing, before);

        api.fail.store(false, AtomicOrdering::SeqCst);
        listing.load_more(&feed).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b", "c", "d"]);
        // An empty-string cursor ends the pagination
        assert!(!listing.has_more());
    }

    #[test]
    fn test_documents_without_uid_are_skipped() {
        let mut orphan = post_doc("x", 1);
        orphan.uid = None;
        let page = ListingPage::from_results(ResultPage {
            results: vec![post_doc("a", 2), orphan],
            next_page: None,
        });
        assert_eq!(page.posts.len(), 1);
    }
}
