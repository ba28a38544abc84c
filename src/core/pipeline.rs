use crate::config::credentials::Credentials;
use crate::core::auth::{token_exchange_for, TokenExchangeStrategy};
use crate::core::fetch::{fetch_strategy_for, EntitlementFetchStrategy};
use crate::core::{input, report};
use crate::core::{AssetEntitlement, ConfigProvider, OutputRow, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;

/// Service tags in, warranty report out.
///
/// `extract` loads the tags, exchanges the credentials for a token and fetches
/// the entitlements; `transform` flattens them; `load` writes the CSV.
pub struct WarrantyPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    credentials: Credentials,
    client: Client,
    token_exchange: Box<dyn TokenExchangeStrategy>,
    fetcher: Box<dyn EntitlementFetchStrategy>,
}

impl<S: Storage, C: ConfigProvider> WarrantyPipeline<S, C> {
    pub fn new(storage: S, config: C, credentials: Credentials) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let token_exchange = token_exchange_for(config.token_mode(), config.token_url());
        let fetcher = fetch_strategy_for(
            config.fetch_mode(),
            config.entitlements_url(),
            config.failure_policy(),
        );

        Ok(Self {
            storage,
            config,
            credentials,
            client,
            token_exchange,
            fetcher,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for WarrantyPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<AssetEntitlement>> {
        let input_path = self.config.input_path();
        let records = input::load_service_tags(&self.storage, input_path).await?;

        // Nothing to look up: stop before any request goes out
        if records.is_empty() {
            return Err(EtlError::EmptyInput {
                path: input_path.to_string(),
            });
        }

        tracing::info!(
            "Requesting access token ({} credentials)",
            self.token_exchange.mode()
        );
        let token = self
            .token_exchange
            .exchange(&self.client, &self.credentials)
            .await?;
        tracing::info!("Access token acquired");

        tracing::info!(
            "Fetching entitlements for {} service tags ({}, on error: {})",
            records.len(),
            self.fetcher.mode(),
            self.config.failure_policy()
        );
        let assets = self.fetcher.fetch(&self.client, &token, &records).await?;
        tracing::info!("Received {} assets", assets.len());

        Ok(assets)
    }

    async fn transform(&self, data: Vec<AssetEntitlement>) -> Result<Vec<OutputRow>> {
        let rows = report::flatten(&data);

        let without_entitlements = data
            .iter()
            .filter(|asset| asset.entitlement_lines().is_empty())
            .count();
        if without_entitlements > 0 {
            tracing::debug!(
                "{} assets have no entitlements and produce no rows",
                without_entitlements
            );
        }

        Ok(rows)
    }

    async fn load(&self, rows: Vec<OutputRow>) -> Result<String> {
        let output_path = self.config.output_path();
        let data = report::render_report(&rows)?;

        tracing::debug!("Writing {} rows ({} bytes)", rows.len(), data.len());
        self.storage.write_file(output_path, &data).await?;

        tracing::info!("Output written to: {}", output_path);
        Ok(output_path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::domain::model::{FailurePolicy, FetchMode};
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(path: &str, data: &[u8]) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            storage
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        fn exists(&self, path: &str) -> bool {
            self.files
                .try_lock()
                .map(|files| files.contains_key(path))
                .unwrap_or(false)
        }

        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn config_for(server: &MockServer) -> RunConfig {
        let mut config = RunConfig::new("tags.csv", "report.csv");
        config.token_url = server.url("/auth/oauth/v2/token");
        config.entitlements_url = server.url("/asset-entitlements");
        config
    }

    fn credentials() -> Credentials {
        Credentials::new("test-client", "test-secret")
    }

    #[tokio::test]
    async fn test_extract_batched() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/oauth/v2/token");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "tok-1", "token_type": "Bearer"}));
        });
        let entitlements_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/asset-entitlements")
                .query_param("servicetags", "AAA1111,BBB2222")
                .header("Authorization", "Bearer tok-1");
            then.status(200).json_body(serde_json::json!([
                {"serviceTag": "AAA1111", "entitlements": [{"itemNumber": "1"}]},
                {"serviceTag": "BBB2222", "entitlements": []}
            ]));
        });

        let storage = MockStorage::with_file("tags.csv", b"serviceTag\nAAA1111\nBBB2222\n").await;
        let pipeline = WarrantyPipeline::new(storage, config_for(&server), credentials()).unwrap();

        let assets = pipeline.extract().await.unwrap();

        token_mock.assert();
        entitlements_mock.assert();
        assert_eq!(assets.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_empty_input_makes_no_requests() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/oauth/v2/token");
            then.status(200).json_body(serde_json::json!({"access_token": "tok"}));
        });

        let storage = MockStorage::with_file("tags.csv", b"serviceTag\n").await;
        let pipeline = WarrantyPipeline::new(storage, config_for(&server), credentials()).unwrap();

        let err = pipeline.extract().await.unwrap_err();

        assert!(matches!(err, EtlError::EmptyInput { .. }));
        token_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_extract_per_tag_uses_configured_strategy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/oauth/v2/token");
            then.status(200).json_body(serde_json::json!({"access_token": "tok"}));
        });
        let tag_mock = server.mock(|when, then| {
            when.method(GET).path("/asset-entitlements/AAA1111");
            then.status(200)
                .json_body(serde_json::json!([{"serviceTag": "AAA1111", "entitlements": []}]));
        });

        let mut config = config_for(&server);
        config.fetch_mode = FetchMode::PerTag;
        config.failure_policy = FailurePolicy::Skip;
        let storage = MockStorage::with_file("tags.csv", b"serviceTag\nAAA1111\n").await;
        let pipeline = WarrantyPipeline::new(storage, config, credentials()).unwrap();

        let assets = pipeline.extract().await.unwrap();

        tag_mock.assert();
        assert_eq!(assets.len(), 1);
    }

    #[tokio::test]
    async fn test_load_writes_report_to_storage() {
        let storage = MockStorage::default();
        let pipeline = WarrantyPipeline::new(
            storage.clone(),
            RunConfig::new("tags.csv", "out/report.csv"),
            credentials(),
        )
        .unwrap();

        let assets = vec![serde_json::from_value(serde_json::json!({
            "serviceTag": "AAA1111",
            "entitlements": [{"itemNumber": "1"}, {"itemNumber": "2"}]
        }))
        .unwrap()];
        let rows = pipeline.transform(assets).await.unwrap();
        let output_path = pipeline.load(rows).await.unwrap();

        assert_eq!(output_path, "out/report.csv");
        let data = storage.get_file("out/report.csv").await.unwrap();
        let text = String::from_utf8(data).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("id,serviceTag,"));
    }
}
