use crate::domain::model::{AssetEntitlement, FailurePolicy, FetchMode, OutputRow, TokenMode};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn token_url(&self) -> &str;
    fn entitlements_url(&self) -> &str;
    fn token_mode(&self) -> TokenMode;
    fn fetch_mode(&self) -> FetchMode;
    fn failure_policy(&self) -> FailurePolicy;
    fn request_timeout(&self) -> Option<Duration>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<AssetEntitlement>>;
    async fn transform(&self, data: Vec<AssetEntitlement>) -> Result<Vec<OutputRow>>;
    async fn load(&self, rows: Vec<OutputRow>) -> Result<String>;
}
