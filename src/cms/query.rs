//! Query model for the content API
//!
//! Queries are expressed with Prismic predicates and orderings. Both the
//! HTTP client and the in-memory store understand the same model.

use serde::{Deserialize, Serialize};

/// Document type path
pub const DOCUMENT_TYPE: &str = "document.type";
/// Document id path
pub const DOCUMENT_ID: &str = "document.id";
/// First publication date path
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";
/// Last publication date path
pub const LAST_PUBLICATION_DATE: &str = "document.last_publication_date";

/// Page size used when a query does not set one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A single filter over documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Predicate {
    /// Field equals value
    At { path: String, value: String },
    /// Field differs from value
    Not { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn not(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Not {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Render in Prismic syntax, e.g. `[at(document.type,"post")]`
    pub fn to_prismic(&self) -> String {
        let (name, path, value) = match self {
            Predicate::At { path, value } => ("at", path, value),
            Predicate::Not { path, value } => ("not", path, value),
        };
        format!("[{}({},\"{}\")]", name, path, value.replace('"', "\\\""))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    fn to_prismic(&self) -> String {
        match self.direction {
            Direction::Asc => self.field.clone(),
            Direction::Desc => format!("{} desc", self.field),
        }
    }
}

/// A document search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    /// Field projection, e.g. `post.title`; empty means every field
    pub fetch: Vec<String>,
    pub page_size: usize,
    pub orderings: Vec<Ordering>,
    /// Only return documents that come after this document id in the ordering
    pub after: Option<String>,
    /// 1-based page number
    pub page: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            fetch: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            orderings: Vec::new(),
            after: None,
            page: 1,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn fetch(mut self, field: impl Into<String>) -> Self {
        self.fetch.push(field.into());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Value of the `q` parameter
    pub fn q_param(&self) -> String {
        let predicates: String = self.predicates.iter().map(Predicate::to_prismic).collect();
        format!("[{}]", predicates)
    }

    /// Value of the `orderings` parameter, if any
    pub fn orderings_param(&self) -> Option<String> {
        if self.orderings.is_empty() {
            return None;
        }
        let orderings: Vec<String> = self.orderings.iter().map(Ordering::to_prismic).collect();
        Some(format!("[{}]", orderings.join(",")))
    }

    /// Value of the `fetch` parameter, if any
    pub fn fetch_param(&self) -> Option<String> {
        if self.fetch.is_empty() {
            None
        } else {
            Some(self.fetch.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q_param() {
        let query = Query::new()
            .predicate(Predicate::at(DOCUMENT_TYPE, "post"))
            .predicate(Predicate::not("my.post.uid", "draft"));
        assert_eq!(
            query.q_param(),
            r#"[[at(document.type,"post")][not(my.post.uid,"draft")]]"#
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let predicate = Predicate::at("my.post.uid", r#"say "hi""#);
        assert_eq!(predicate.to_prismic(), r#"[at(my.post.uid,"say \"hi\"")]"#);
    }

    #[test]
    fn test_orderings_and_fetch() {
        let query = Query::new()
            .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
            .order_by(Ordering::asc("my.post.title"))
            .fetch("post.title")
            .fetch("post.author");
        assert_eq!(
            query.orderings_param().as_deref(),
            Some("[document.first_publication_date desc,my.post.title]")
        );
        assert_eq!(query.fetch_param().as_deref(), Some("post.title,post.author"));
        assert_eq!(Query::new().orderings_param(), None);
        assert_eq!(Query::new().fetch_param(), None);
    }

    #[test]
    fn test_page_size_and_page_are_at_least_one() {
        assert_eq!(Query::new().page_size(0).page_size, 1);
        assert_eq!(Query::new().page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(Query::new().page, 1);
        assert_eq!(Query::new().page(0).page, 1);
    }
}
