//! HTTP client for the headless CMS content API.
//!
//! Documents are written through the transactional mutation endpoint and
//! images through the asset endpoint. Every call authenticates with the
//! write token as a bearer credential.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CmsError;

/// Longest response body excerpt kept in [`CmsError::UnexpectedStatus`].
const ERROR_BODY_EXCERPT: usize = 512;

/// Client for the CMS HTTP API.
///
/// `api_url` includes the API version segment, e.g.
/// `https://abc123.api.sanity.io/v2023-05-03`.
pub struct CmsClient {
    client: Client,
    base_url: Url,
    dataset: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(rename = "transactionId")]
    transaction_id: String,
    #[serde(default)]
    results: Vec<serde::de::IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    documents: Vec<Value>,
}

/// Outcome of a committed mutation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub transaction_id: String,
}

impl CmsClient {
    /// # Errors
    ///
    /// Returns [`CmsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`CmsError::InvalidBaseUrl`] if `api_url` does not
    /// parse.
    pub fn new(
        api_url: &str,
        dataset: &str,
        token: &str,
        timeout_secs: u64,
    ) -> Result<Self, CmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("utrabeauty-importer/0.1")
            .build()?;

        let base_url = Url::parse(api_url.trim_end_matches('/')).map_err(|e| CmsError::InvalidBaseUrl {
            url: api_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            dataset: dataset.to_owned(),
            token: token.to_owned(),
        })
    }

    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Commits `mutations` as one transaction.
    ///
    /// # Errors
    ///
    /// - [`CmsError::UnexpectedStatus`] on any non-2xx response.
    /// - [`CmsError::Http`] on network failure.
    /// - [`CmsError::Deserialize`] if the response is not the expected shape.
    pub async fn mutate(&self, mutations: Vec<Value>) -> Result<MutationOutcome, CmsError> {
        let mut url = self.endpoint(&["data", "mutate", &self.dataset])?;
        url.query_pairs_mut().append_pair("returnIds", "true");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;
        let body = Self::read_success(response, "mutate").await?;

        let parsed: MutateResponse =
            serde_json::from_str(&body).map_err(|e| CmsError::Deserialize {
                context: "mutate response".to_owned(),
                source: e,
            })?;

        tracing::debug!(
            transaction_id = %parsed.transaction_id,
            documents = parsed.results.len(),
            "cms mutation committed"
        );

        Ok(MutationOutcome {
            transaction_id: parsed.transaction_id,
        })
    }

    /// Creates `document`, or replaces it wholesale if its `_id` exists.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::mutate`].
    pub async fn create_or_replace(&self, document: Value) -> Result<MutationOutcome, CmsError> {
        self.mutate(vec![json!({ "createOrReplace": document })])
            .await
    }

    /// Sets top-level `fields` on an existing document.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::mutate`].
    pub async fn patch_set(&self, id: &str, fields: Value) -> Result<MutationOutcome, CmsError> {
        self.mutate(vec![json!({ "patch": { "id": id, "set": fields } })])
            .await
    }

    /// Uploads raw image bytes and returns the new asset document id.
    ///
    /// # Errors
    ///
    /// - [`CmsError::UnexpectedStatus`] on any non-2xx response.
    /// - [`CmsError::Http`] on network failure.
    /// - [`CmsError::Deserialize`] if the response carries no asset document.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<String, CmsError> {
        let mut url = self.endpoint(&["assets", "images", &self.dataset])?;
        url.query_pairs_mut().append_pair("filename", filename);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        let body = Self::read_success(response, "asset upload").await?;

        let parsed: AssetResponse =
            serde_json::from_str(&body).map_err(|e| CmsError::Deserialize {
                context: format!("asset upload response for {filename}"),
                source: e,
            })?;

        Ok(parsed.document.id)
    }

    /// Fetches one document by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// - [`CmsError::UnexpectedStatus`] on any non-2xx response.
    /// - [`CmsError::Http`] on network failure.
    /// - [`CmsError::Deserialize`] if the response is not the expected shape.
    pub async fn get_document(&self, id: &str) -> Result<Option<Value>, CmsError> {
        let url = self.endpoint(&["data", "doc", &self.dataset, id])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = Self::read_success(response, "get document").await?;

        let parsed: DocumentsResponse =
            serde_json::from_str(&body).map_err(|e| CmsError::Deserialize {
                context: format!("document {id}"),
                source: e,
            })?;

        Ok(parsed.documents.into_iter().next())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CmsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CmsError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base URL".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_success(response: reqwest::Response, endpoint: &str) -> Result<String, CmsError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(CmsError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: endpoint.to_owned(),
                body: excerpt,
            });
        }
        Ok(body)
    }
}
