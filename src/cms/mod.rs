//! Content API - the headless CMS every page reads from
//!
//! [`ContentApi`] is the only seam between the blog and the CMS. The
//! production implementation talks to the Prismic REST API
//! ([`PrismicClient`]); [`InMemoryCms`] serves documents from a JSON fixture
//! file for offline work and tests.

mod error;
mod memory;
mod prismic;
mod query;

pub use error::{CmsError, Result};
pub use memory::InMemoryCms;
pub use prismic::PrismicClient;
pub use query::{
    Direction, Ordering, Predicate, Query, DEFAULT_PAGE_SIZE, DOCUMENT_ID, DOCUMENT_TYPE,
    FIRST_PUBLICATION_DATE, LAST_PUBLICATION_DATE,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A document as returned by the content API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default, with = "timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Opaque continuation token for a paginated query.
///
/// Never empty: the API signals the last page with a missing, null or empty
/// `next_page`, and all of those become `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CMS ref that makes queries resolve against draft content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub results: Vec<Document>,
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub next_page: Option<Cursor>,
}

fn deserialize_cursor<'de, D>(deserializer: D) -> std::result::Result<Option<Cursor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(Cursor::new))
}

/// Read access to the headless CMS
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Run a search and return its first page
    async fn query(&self, query: &Query, preview: Option<&PreviewRef>) -> Result<ResultPage>;

    /// Follow a cursor returned by a previous page
    async fn next_page(&self, cursor: &Cursor, preview: Option<&PreviewRef>) -> Result<ResultPage>;

    /// Fetch a single document by its type and uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<Document>> {
        let query = Query::new()
            .predicate(Predicate::at(format!("my.{}.uid", doc_type), uid))
            .page_size(1);
        let page = self.query(&query, preview).await?;
        Ok(page.results.into_iter().next())
    }

    /// Fetch a single document by id
    async fn get_by_id(&self, id: &str, preview: Option<&PreviewRef>) -> Result<Option<Document>> {
        let query = Query::new()
            .predicate(Predicate::at(DOCUMENT_ID, id))
            .page_size(1);
        let page = self.query(&query, preview).await?;
        Ok(page.results.into_iter().next())
    }
}

/// Prismic timestamps look like `2021-03-25T19:25:28+0000`
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, FORMAT))
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }
}
