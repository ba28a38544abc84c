pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, credentials::Credentials, CliConfig, RunConfig};
pub use crate::core::{etl::EtlEngine, pipeline::WarrantyPipeline};
pub use utils::error::{EtlError, Result};
