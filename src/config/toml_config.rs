use crate::domain::model::{FailurePolicy, FetchMode, TokenMode};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Optional settings file. Every key may be left out; the CLI and the
/// built-in defaults fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    pub token_url: Option<String>,
    pub entitlements_url: Option<String>,
    pub token_mode: Option<TokenMode>,
    pub fetch_mode: Option<FetchMode>,
    pub on_error: Option<FailurePolicy>,
    pub timeout_seconds: Option<u64>,
}

/// Origin reported for settings parsed from a string rather than a file.
const INLINE_SOURCE: &str = "<inline>";

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::SettingsFile {
            path: origin.clone(),
            message: format!("cannot read file: {}", e),
        })?;
        Self::parse(&content, &origin)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, INLINE_SOURCE)
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content, origin)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::SettingsFile {
            path: origin.to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_HOST})
    fn substitute_env_vars(content: &str, origin: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::SettingsFile {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}
