//! Post models
//!
//! Projections of CMS documents: the short summary shown on the listing,
//! the full post shown on its own page, and the reduced reference used for
//! previous/next navigation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::richtext::{self, RichTextNode};
use crate::cms::{CmsError, Document};
use crate::helpers::post_path;

/// A post as listed on the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
}

impl PostSummary {
    pub fn from_document(doc: &Document) -> Result<Self, CmsError> {
        let uid = require_uid(doc)?;
        let fields = post_fields(doc)?;

        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
        })
    }

    /// URL path (without root)
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub banner: Option<Banner>,
    pub content: Vec<ContentBlock>,
}

impl Post {
    pub fn from_document(doc: &Document) -> Result<Self, CmsError> {
        let uid = require_uid(doc)?;
        let fields = post_fields(doc)?;

        let banner = fields.banner.and_then(|image| {
            let url = image.url.filter(|u| !u.trim().is_empty())?;
            Some(Banner {
                url,
                alt: image.alt.filter(|a| !a.is_empty()),
            })
        });

        Ok(Self {
            id: doc.id.clone(),
            uid,
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
            banner,
            content: fields.content,
        })
    }

    /// URL path (without root)
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// Banner image of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, deserialize_with = "nullable_string")]
    pub heading: String,
    #[serde(default)]
    pub body: Vec<RichTextNode>,
}

impl ContentBlock {
    /// Body rendered as HTML
    pub fn body_html(&self) -> String {
        richtext::as_html(&self.body)
    }

    /// Body as plain text
    pub fn body_text(&self) -> String {
        richtext::as_text(&self.body)
    }
}

/// Reference to a neighboring post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPost {
    pub title: String,
    pub uid: String,
}

impl NavPost {
    /// `None` when the document has no uid to link to
    pub fn from_document(doc: &Document) -> Option<Self> {
        let uid = doc.uid.clone().filter(|u| !u.is_empty())?;
        let title = doc
            .data
            .get("title")
            .map(text_value)
            .unwrap_or_default();
        Some(Self { title, uid })
    }

    /// URL path (without root)
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// Document data fields shared by every post projection
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostFields {
    #[serde(deserialize_with = "text_field")]
    title: String,
    #[serde(deserialize_with = "optional_text_field")]
    subtitle: Option<String>,
    #[serde(deserialize_with = "text_field")]
    author: String,
    banner: Option<ImageField>,
    #[serde(deserialize_with = "nullable_blocks")]
    content: Vec<ContentBlock>,
}

/// Image field; an empty image comes back as `{}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageField {
    url: Option<String>,
    alt: Option<String>,
}

fn post_fields(doc: &Document) -> Result<PostFields, CmsError> {
    if doc.data.is_null() {
        return Ok(PostFields::default());
    }
    Ok(serde_json::from_value(doc.data.clone())?)
}

fn require_uid(doc: &Document) -> Result<String, CmsError> {
    doc.uid
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| CmsError::InvalidResponse(format!("document {} has no uid", doc.id)))
}

/// Key text fields are strings; title fields are rich text
fn text_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(_) => {
            serde_json::from_value::<Vec<RichTextNode>>(value.clone())
                .map(|nodes| richtext::as_text(&nodes))
                .unwrap_or_default()
        }
        _ => String::new(),
    }
}

fn text_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(text_value(&value))
}

fn optional_text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = text_field(deserializer)?;
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ContentBlock>>::deserialize(deserializer)?.unwrap_or_default())
}
