use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::model::{
    prismic::{ApiInfo, RawDocument, RawPage},
    Cursor,
};

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("the repository has no master ref")]
    NoMasterRef,

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// The queries the site needs from the CMS.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn query_by_type(
        &self,
        document_type: &str,
        page_size: u32,
    ) -> Result<RawPage, GatewayError>;

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> Result<Option<RawDocument>, GatewayError>;

    /// Follows a continuation cursor returned by an earlier query.
    async fn fetch_page(&self, cursor: &Cursor) -> Result<RawPage, GatewayError>;
}

pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
    q: &'a str,
    #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

impl PrismicClient {
    pub fn new(
        endpoint: Url,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        if endpoint.cannot_be_a_base() {
            return Err(GatewayError::Endpoint(endpoint.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| GatewayError::Transport {
                url: endpoint.to_string(),
                source,
            })?;

        Ok(PrismicClient {
            http,
            endpoint,
            access_token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        tracing::debug!(url, "cms request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|source| GatewayError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn master_ref(&self) -> Result<String, GatewayError> {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let info: ApiInfo = self.get_json(url.as_str()).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(GatewayError::NoMasterRef)
    }

    fn search_url(
        &self,
        reference: &str,
        predicate: &str,
        page_size: Option<u32>,
    ) -> Result<Url, GatewayError> {
        let query = serde_urlencoded::to_string(SearchParams {
            reference,
            q: predicate,
            page_size,
            access_token: self.access_token.as_deref(),
        })
        .map_err(|err| GatewayError::Endpoint(err.to_string()))?;

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["documents", "search"]);
        url.set_query(Some(&query));
        Ok(url)
    }

    async fn search(
        &self,
        predicate: &str,
        page_size: Option<u32>,
    ) -> Result<RawPage, GatewayError> {
        let reference = self.master_ref().await?;
        let url = self.search_url(&reference, predicate, page_size)?;
        self.get_json(url.as_str()).await
    }
}

/// Predicate values are quoted; a uid that would need escaping can never match.
fn quotable(value: &str) -> bool {
    !value.contains(['"', '\\'])
}

#[async_trait]
impl Gateway for PrismicClient {
    async fn query_by_type(
        &self,
        document_type: &str,
        page_size: u32,
    ) -> Result<RawPage, GatewayError> {
        let predicate = format!("[[at(document.type, \"{document_type}\")]]");
        self.search(&predicate, Some(page_size)).await
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> Result<Option<RawDocument>, GatewayError> {
        if !quotable(uid) {
            return Ok(None);
        }

        let predicate = format!("[[at(my.{document_type}.uid, \"{uid}\")]]");
        let page = self.search(&predicate, Some(1)).await?;
        Ok(page.results.into_iter().next())
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<RawPage, GatewayError> {
        self.get_json(cursor.as_str()).await
    }
}
