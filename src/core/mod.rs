pub mod auth;
pub mod etl;
pub mod fetch;
pub mod input;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{AssetEntitlement, InputRecord, OutputRow};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
