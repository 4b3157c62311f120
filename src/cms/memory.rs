//! In-memory content API backed by a JSON fixture

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::query::{
    Direction, Ordering, Predicate, Query, DOCUMENT_ID, DOCUMENT_TYPE, FIRST_PUBLICATION_DATE,
    LAST_PUBLICATION_DATE,
};
use super::{CmsError, ContentApi, Cursor, Document, PreviewRef, Result, ResultPage};

/// Fixture file layout: published documents plus draft overlays per preview ref
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    previews: HashMap<String, Vec<Document>>,
}

/// Continuation state encoded in the cursors this store hands out
#[derive(Debug, Serialize, Deserialize)]
struct MemoryCursor {
    query: Query,
    page: usize,
}

/// A content API that answers queries from documents held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCms {
    documents: Vec<Document>,
    previews: HashMap<String, Vec<Document>>,
}

impl InMemoryCms {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            previews: HashMap::new(),
        }
    }

    /// Load a fixture file: `{ "documents": [...], "previews": { "<ref>": [...] } }`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} documents and {} preview refs from {:?}",
            fixture.documents.len(),
            fixture.previews.len(),
            path.as_ref()
        );
        Ok(Self {
            documents: fixture.documents,
            previews: fixture.previews,
        })
    }

    /// Register drafts that become visible under `preview_ref`
    pub fn with_preview(mut self, preview_ref: &str, drafts: Vec<Document>) -> Self {
        self.previews.insert(preview_ref.to_string(), drafts);
        self
    }

    /// Published documents, overlaid with the drafts of the preview ref
    fn snapshot(&self, preview: Option<&PreviewRef>) -> Result<Vec<Document>> {
        let Some(preview) = preview else {
            return Ok(self.documents.clone());
        };
        let drafts = self
            .previews
            .get(preview.as_str())
            .ok_or_else(|| CmsError::InvalidRef(preview.as_str().to_string()))?;

        let mut documents = self.documents.clone();
        for draft in drafts {
            match documents.iter_mut().find(|d| d.id == draft.id) {
                Some(existing) => *existing = draft.clone(),
                None => documents.push(draft.clone()),
            }
        }
        Ok(documents)
    }

    fn run(&self, query: &Query, page: usize, preview: Option<&PreviewRef>) -> Result<ResultPage> {
        let mut ordered = self.snapshot(preview)?;

        // Stable sort keeps insertion order for ties
        ordered.sort_by(|a, b| compare(a, b, &query.orderings));

        // `after` positions on the ordering, even when a predicate excludes
        // the anchor document itself
        if let Some(after) = &query.after {
            ordered = match ordered.iter().position(|d| &d.id == after) {
                Some(pos) => ordered.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let matching: Vec<Document> = ordered
            .into_iter()
            .filter(|doc| query.predicates.iter().all(|p| matches(doc, p)))
            .collect();

        let page_size = query.page_size.max(1);
        let start = (page - 1).saturating_mul(page_size);
        let has_more = matching.len() > start.saturating_add(page_size);

        let results = matching
            .into_iter()
            .skip(start)
            .take(page_size)
            .map(|doc| project(doc, &query.fetch))
            .collect();

        let next_page = if has_more {
            let cursor = MemoryCursor {
                query: query.clone(),
                page: page + 1,
            };
            Cursor::new(serde_json::to_string(&cursor)?)
        } else {
            None
        };

        Ok(ResultPage { results, next_page })
    }
}

#[async_trait]
impl ContentApi for InMemoryCms {
    async fn query(&self, query: &Query, preview: Option<&PreviewRef>) -> Result<ResultPage> {
        self.run(query, query.page.max(1), preview)
    }

    async fn next_page(&self, cursor: &Cursor, preview: Option<&PreviewRef>) -> Result<ResultPage> {
        let state: MemoryCursor = serde_json::from_str(cursor.as_str())
            .map_err(|_| CmsError::InvalidCursor(cursor.to_string()))?;
        if state.page == 0 {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }
        self.run(&state.query, state.page, preview)
    }
}

/// Resolve a predicate path like `document.type` or `my.post.uid`
fn field_value(doc: &Document, path: &str) -> Option<String> {
    match path {
        DOCUMENT_ID => return Some(doc.id.clone()),
        DOCUMENT_TYPE => return Some(doc.doc_type.clone()),
        _ => {}
    }

    let rest = path.strip_prefix("my.")?;
    let (doc_type, field) = rest.split_once('.')?;
    if doc_type != doc.doc_type {
        return None;
    }
    if field == "uid" {
        return doc.uid.clone();
    }
    match doc.data.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => field_value(doc, path).as_deref() == Some(value.as_str()),
        Predicate::Not { path, value } => field_value(doc, path).as_deref() != Some(value.as_str()),
    }
}

fn compare(a: &Document, b: &Document, orderings: &[Ordering]) -> cmp::Ordering {
    for ordering in orderings {
        let by_field = match ordering.field.as_str() {
            FIRST_PUBLICATION_DATE => a.first_publication_date.cmp(&b.first_publication_date),
            LAST_PUBLICATION_DATE => a.last_publication_date.cmp(&b.last_publication_date),
            field => field_value(a, field).cmp(&field_value(b, field)),
        };
        let by_field = match ordering.direction {
            Direction::Asc => by_field,
            Direction::Desc => by_field.reverse(),
        };
        if by_field != cmp::Ordering::Equal {
            return by_field;
        }
    }
    cmp::Ordering::Equal
}

/// Apply a `fetch` projection such as `post.title` to the document data
fn project(mut doc: Document, fetch: &[String]) -> Document {
    if fetch.is_empty() {
        return doc;
    }
    let keep: Vec<&str> = fetch
        .iter()
        .filter_map(|f| f.split_once('.'))
        .filter(|(doc_type, _)| *doc_type == doc.doc_type)
        .map(|(_, field)| field)
        .collect();
    if let serde_json::Value::Object(map) = &mut doc.data {
        map.retain(|key, _| keep.contains(&key.as_str()));
    }
    doc
}
