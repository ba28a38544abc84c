//! Entitlement lookups against the asset-entitlement endpoint.
//!
//! [`BatchedFetch`] sends every tag in one `servicetags` query;
//! [`PerTagFetch`] issues one path-scoped request per tag, sequentially.
//! Both apply the same [`FailurePolicy`] to a request that comes back with a
//! non-success status or an unreadable body. Transport failures always abort.

use crate::domain::model::{AssetEntitlement, BearerToken, FailurePolicy, FetchMode, InputRecord};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use url::Url;

#[async_trait]
pub trait EntitlementFetchStrategy: Send + Sync {
    fn mode(&self) -> FetchMode;

    async fn fetch(
        &self,
        client: &Client,
        token: &BearerToken,
        records: &[InputRecord],
    ) -> Result<Vec<AssetEntitlement>>;
}

pub struct BatchedFetch {
    entitlements_url: String,
    policy: FailurePolicy,
}

impl BatchedFetch {
    pub fn new(entitlements_url: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            entitlements_url: entitlements_url.into(),
            policy,
        }
    }
}

#[async_trait]
impl EntitlementFetchStrategy for BatchedFetch {
    fn mode(&self) -> FetchMode {
        FetchMode::Batched
    }

    async fn fetch(
        &self,
        client: &Client,
        token: &BearerToken,
        records: &[InputRecord],
    ) -> Result<Vec<AssetEntitlement>> {
        let service_tags = records
            .iter()
            .map(|r| r.service_tag.as_str())
            .collect::<Vec<_>>()
            .join(",");

        tracing::debug!(
            "GET {} servicetags={}",
            self.entitlements_url,
            service_tags
        );

        let response = client
            .get(&self.entitlements_url)
            .bearer_auth(token.as_str())
            .header(ACCEPT, "application/json")
            .query(&[("servicetags", service_tags.as_str())])
            .send()
            .await?;

        match read_assets(response).await? {
            Ok(assets) => Ok(assets),
            Err(failure) => {
                let scope = format!("{} service tags", records.len());
                apply_policy(self.policy, failure, &scope)?;
                Ok(Vec::new())
            }
        }
    }
}

pub struct PerTagFetch {
    entitlements_url: String,
    policy: FailurePolicy,
}

impl PerTagFetch {
    pub fn new(entitlements_url: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            entitlements_url: entitlements_url.into(),
            policy,
        }
    }

    /// `<entitlements_url>/<tag>`, with the tag encoded as one path segment.
    pub fn tag_url(&self, service_tag: &str) -> Result<Url> {
        let invalid = |reason: &str| EtlError::InvalidConfigValue {
            field: "api.entitlements_url".to_string(),
            value: self.entitlements_url.clone(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(&self.entitlements_url).map_err(|e| invalid(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot take a path segment"))?
            .pop_if_empty()
            .push(service_tag);
        Ok(url)
    }
}

#[async_trait]
impl EntitlementFetchStrategy for PerTagFetch {
    fn mode(&self) -> FetchMode {
        FetchMode::PerTag
    }

    async fn fetch(
        &self,
        client: &Client,
        token: &BearerToken,
        records: &[InputRecord],
    ) -> Result<Vec<AssetEntitlement>> {
        let mut assets = Vec::new();
        let mut skipped = 0usize;

        for (index, record) in records.iter().enumerate() {
            let url = self.tag_url(&record.service_tag)?;
            tracing::debug!("GET {} ({}/{})", url, index + 1, records.len());

            let response = client
                .get(url)
                .bearer_auth(token.as_str())
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            match read_assets(response).await? {
                Ok(found) => {
                    tracing::debug!("Warranty info for {}: {} assets", record.service_tag, found.len());
                    assets.extend(found);
                }
                Err(failure) => {
                    apply_policy(self.policy, failure, &record.service_tag)?;
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} of {} service tags after failed lookups",
                skipped,
                records.len()
            );
        }

        Ok(assets)
    }
}

pub fn fetch_strategy_for(
    mode: FetchMode,
    entitlements_url: &str,
    policy: FailurePolicy,
) -> Box<dyn EntitlementFetchStrategy> {
    match mode {
        FetchMode::Batched => Box::new(BatchedFetch::new(entitlements_url, policy)),
        FetchMode::PerTag => Box::new(PerTagFetch::new(entitlements_url, policy)),
    }
}

/// A request that reached the API but produced no usable entitlements.
#[derive(Debug)]
pub struct RequestFailure {
    pub status: StatusCode,
    pub message: String,
}

/// `Abort` turns the failure into a fatal error; `Skip` logs it and lets
/// the caller continue without the identifiers in `scope`.
fn apply_policy(policy: FailurePolicy, failure: RequestFailure, scope: &str) -> Result<()> {
    match policy {
        FailurePolicy::Abort => Err(EtlError::fetch(Some(failure.status), failure.message)),
        FailurePolicy::Skip => {
            tracing::warn!(
                "Failed to fetch warranty info for {}: {}, {}",
                scope,
                failure.status,
                failure.message
            );
            Ok(())
        }
    }
}

/// Outer error: transport failure while reading the body (always fatal).
/// Inner error: the API answered but the answer is unusable.
async fn read_assets(
    response: reqwest::Response,
) -> Result<std::result::Result<Vec<AssetEntitlement>, RequestFailure>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Ok(Err(RequestFailure {
            status,
            message: body,
        }));
    }

    Ok(parse_assets(&body).map_err(|e| RequestFailure {
        status,
        message: format!("malformed entitlement payload: {}", e),
    }))
}

/// Accepts a JSON array of assets, or a single asset object.
pub fn parse_assets(body: &str) -> serde_json::Result<Vec<AssetEntitlement>> {
    let json: serde_json::Value = serde_json::from_str(body)?;
    match json {
        serde_json::Value::Array(_) => serde_json::from_value(json),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}
