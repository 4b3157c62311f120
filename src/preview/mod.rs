//! CMS preview sessions
//!
//! The CMS sends editors to `/api/preview?token=...&documentId=...`. The
//! token doubles as a ref: once it is stored in the preview cookie, every
//! content query of that browser resolves against draft content.

use thiserror::Error;

use crate::cms::{CmsError, ContentApi, Document, PreviewRef, Query};
use crate::helpers::post_path;

/// Where to send the editor, and the ref to remember for the session
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRedirect {
    pub location: String,
    pub preview_ref: PreviewRef,
}

/// Preview exchange error
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Missing, invalid or expired token
    #[error("Invalid token")]
    InvalidToken,

    /// The content API could not be reached
    #[error("Content API unavailable: {0}")]
    Unavailable(#[source] CmsError),
}

impl From<CmsError> for PreviewError {
    fn from(e: CmsError) -> Self {
        if e.is_rejection() {
            PreviewError::InvalidToken
        } else {
            PreviewError::Unavailable(e)
        }
    }
}

/// Map a document to the page that displays it
pub fn link_resolver(doc: &Document, post_type: &str) -> String {
    match doc.uid.as_deref() {
        Some(uid) if doc.doc_type == post_type && !uid.is_empty() => post_path(uid),
        _ => "/".to_string(),
    }
}

/// Trade a preview token for a redirect location.
///
/// The document is looked up with the token as its ref, which also proves
/// the token is valid. Without a document id the token is checked with an
/// empty search and the editor lands on the home page.
pub async fn exchange(
    api: &dyn ContentApi,
    token: Option<&str>,
    document_id: Option<&str>,
    post_type: &str,
) -> Result<PreviewRedirect, PreviewError> {
    let preview_ref = token
        .and_then(PreviewRef::new)
        .ok_or(PreviewError::InvalidToken)?;

    let location = match document_id.filter(|id| !id.is_empty()) {
        Some(id) => api
            .get_by_id(id, Some(&preview_ref))
            .await?
            .map(|doc| link_resolver(&doc, post_type))
            .unwrap_or_else(|| "/".to_string()),
        None => {
            api.query(&Query::new().page_size(1), Some(&preview_ref))
                .await?;
            "/".to_string()
        }
    };

    tracing::info!("Preview session started, redirecting to {}", location);
    Ok(PreviewRedirect {
        location,
        preview_ref,
    })
}
