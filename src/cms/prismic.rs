//! HTTP client for the Prismic REST API (v2)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::query::Query;
use super::{CmsError, ContentApi, Cursor, PreviewRef, Result, ResultPage};
use crate::config::CmsConfig;

/// API root payload; only the refs matter here
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<RefInfo>,
}

#[derive(Debug, Deserialize)]
struct RefInfo {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// Prismic REST API client
///
/// Every search needs a ref: the preview ref when one is given, otherwise
/// the master ref read from the API root.
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    client: Client,
}

impl PrismicClient {
    /// Create a new client for the configured repository endpoint
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            client,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint)
    }

    fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token.as_str())]),
            None => request,
        }
    }

    async fn master_ref(&self) -> Result<String> {
        let request = self.with_token(self.client.get(&self.endpoint));
        let root: ApiRoot = self.send(request).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or_else(|| CmsError::InvalidResponse("API root has no master ref".to_string()))
    }

    async fn resolve_ref(&self, preview: Option<&PreviewRef>) -> Result<String> {
        match preview {
            Some(preview) => Ok(preview.as_str().to_string()),
            None => self.master_ref().await,
        }
    }

    /// Query string for a search
    fn search_params(query: &Query, reference: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ref", reference.to_string()),
            ("q", query.q_param()),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(orderings) = query.orderings_param() {
            params.push(("orderings", orderings));
        }
        if let Some(fetch) = query.fetch_param() {
            params.push(("fetch", fetch));
        }
        if let Some(after) = &query.after {
            params.push(("after", after.clone()));
        }
        if query.page > 1 {
            params.push(("page", query.page.to_string()));
        }
        params
    }

    /// Prismic echoes the access token in `next_page`; keep it out of cursors
    fn scrub_cursor(mut page: ResultPage) -> ResultPage {
        page.next_page = page.next_page.and_then(|cursor| {
            let Ok(mut url) = Url::parse(cursor.as_str()) else {
                return Some(cursor);
            };
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != "access_token")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut().clear().extend_pairs(&pairs);
            Cursor::new(url.to_string())
        });
        page
    }

    /// Validate a `next_page` URL and pin it to the active ref and token
    fn cursor_url(&self, cursor: &Cursor, reference: Option<&str>) -> Result<Url> {
        let prefix = format!("{}/", self.endpoint);
        if !cursor.as_str().starts_with(&prefix) {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }
        let mut url =
            Url::parse(cursor.as_str()).map_err(|_| CmsError::InvalidCursor(cursor.to_string()))?;

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "access_token" && (reference.is_none() || key != "ref"))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
            if let Some(reference) = reference {
                query.append_pair("ref", reference);
            }
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CmsError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContentApi for PrismicClient {
    async fn query(&self, query: &Query, preview: Option<&PreviewRef>) -> Result<ResultPage> {
        let reference = self.resolve_ref(preview).await?;
        let params = Self::search_params(query, &reference);
        tracing::debug!("Prismic search q={} ref={}", query.q_param(), reference);

        let request = self.with_token(self.client.get(self.search_url()).query(&params));
        self.send(request).await.map(Self::scrub_cursor)
    }

    async fn next_page(&self, cursor: &Cursor, preview: Option<&PreviewRef>) -> Result<ResultPage> {
        let url = self.cursor_url(cursor, preview.map(PreviewRef::as_str))?;
        tracing::debug!("Prismic next page {}", cursor);
        self.send(self.client.get(url)).await.map(Self::scrub_cursor)
    }
}
