pub mod cli;
pub mod credentials;
pub mod toml_config;

use crate::domain::model::{FailurePolicy, FetchMode, TokenMode};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_OUTPUT_FILE: &str = "warranty_data.csv";
pub const DEFAULT_TOKEN_URL: &str = "https://apigtwb2c.us.dell.com/auth/oauth/v2/token";
pub const DEFAULT_ENTITLEMENTS_URL: &str =
    "https://apigtwb2c.us.dell.com/PROD/sbil/eapi/v5/asset-entitlements";

const LONG_ABOUT: &str = "\
Collects warranty entitlements from the Dell asset-entitlement API for the service tags
listed in a CSV file and writes one CSV row per entitlement.

The input CSV needs a header row with a `serviceTag` column; other columns are ignored.
No results are returned unless the API credentials are available, either exported
or in a .env file in the working directory (exported values take precedence):

  DELL_CLIENT_ID / DELL_CLIENT_SECRET   (legacy names client_id / client_secret also work)

A .env file in the legacy format works as is:

  client_id=<your client id>
  client_secret=<your client secret>

Example:
  warranty-etl -f \"MySerialTags.csv\" -r \"WarrantyInfo.csv\"

If -r is given without a name, or left out, the report is saved as warranty_data.csv.";

#[derive(Debug, Clone, Parser)]
#[command(name = "warranty-etl", version)]
#[command(about = "Process a CSV file of service tags into a CSV file of warranty information")]
#[command(long_about = LONG_ABOUT)]
pub struct CliConfig {
    /// The path to the CSV file to use for service tags
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub input_path: String,

    /// The path and filename to store the program output
    #[arg(
        short = 'r',
        long = "result",
        value_name = "CSV",
        num_args = 0..=1,
        default_value = DEFAULT_OUTPUT_FILE,
        default_missing_value = DEFAULT_OUTPUT_FILE
    )]
    pub output_path: String,

    /// Optional TOML settings file (endpoints, modes, timeout)
    #[arg(short, long, value_name = "TOML")]
    pub config: Option<String>,

    /// Credential transport for the token request: form | basic
    #[arg(long, value_name = "MODE")]
    pub token_mode: Option<TokenMode>,

    /// Entitlement lookup shape: batched | per-tag
    #[arg(long, value_name = "MODE")]
    pub fetch_mode: Option<FetchMode>,

    /// What a failed entitlement request does: abort | skip
    #[arg(long, value_name = "POLICY")]
    pub on_error: Option<FailurePolicy>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, help = "Log output format")]
    pub log_format: LogFormat,
}

/// Effective settings for one run: CLI flags over the settings file over
/// built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input_path: String,
    pub output_path: String,
    pub token_url: String,
    pub entitlements_url: String,
    pub token_mode: TokenMode,
    pub fetch_mode: FetchMode,
    pub failure_policy: FailurePolicy,
    pub timeout_seconds: Option<u64>,
}

impl RunConfig {
    /// Builds a config with built-in defaults for everything but the paths.
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        let fetch_mode = FetchMode::default();
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            entitlements_url: DEFAULT_ENTITLEMENTS_URL.to_string(),
            token_mode: TokenMode::default(),
            fetch_mode,
            failure_policy: FailurePolicy::default_for(fetch_mode),
            timeout_seconds: None,
        }
    }

    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let settings = match &cli.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        Ok(Self::merge(cli, settings))
    }

    fn merge(cli: &CliConfig, settings: TomlConfig) -> Self {
        let api = settings.api;
        let fetch_mode = cli.fetch_mode.or(api.fetch_mode).unwrap_or_default();

        Self {
            input_path: cli.input_path.clone(),
            output_path: cli.output_path.clone(),
            token_url: api.token_url.unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            entitlements_url: api
                .entitlements_url
                .unwrap_or_else(|| DEFAULT_ENTITLEMENTS_URL.to_string()),
            token_mode: cli.token_mode.or(api.token_mode).unwrap_or_default(),
            fetch_mode,
            failure_policy: cli
                .on_error
                .or(api.on_error)
                .unwrap_or_else(|| FailurePolicy::default_for(fetch_mode)),
            timeout_seconds: api.timeout_seconds,
        }
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn token_url(&self) -> &str {
        &self.token_url
    }

    fn entitlements_url(&self) -> &str {
        &self.entitlements_url
    }

    fn token_mode(&self) -> TokenMode {
        self.token_mode
    }

    fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("input_path", &self.input_path)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_url("api.token_url", &self.token_url)?;
        validation::validate_url("api.entitlements_url", &self.entitlements_url)?;

        if let Some(timeout) = self.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 600)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["warranty-etl"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_result_flag_defaults() {
        let omitted = parse(&["-f", "tags.csv"]);
        assert_eq!(omitted.output_path, DEFAULT_OUTPUT_FILE);

        // `-r` with no value falls back to the same literal
        let bare = parse(&["-f", "tags.csv", "-r"]);
        assert_eq!(bare.output_path, DEFAULT_OUTPUT_FILE);

        let named = parse(&["-f", "tags.csv", "-r", "WarrantyInfo.csv"]);
        assert_eq!(named.output_path, "WarrantyInfo.csv");
    }

    #[test]
    fn test_file_flag_is_required() {
        let result = CliConfig::try_parse_from(["warranty-etl", "-r", "out.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_flag_is_display_help() {
        let err = CliConfig::try_parse_from(["warranty-etl", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_mode_flags_parse() {
        let cli = parse(&[
            "--file",
            "tags.csv",
            "--token-mode",
            "basic",
            "--fetch-mode",
            "per-tag",
            "--on-error",
            "abort",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.token_mode, Some(TokenMode::Basic));
        assert_eq!(cli.fetch_mode, Some(FetchMode::PerTag));
        assert_eq!(cli.on_error, Some(FailurePolicy::Abort));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result =
            CliConfig::try_parse_from(["warranty-etl", "-f", "tags.csv", "--fetch-mode", "bulk"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_defaults() {
        let cli = parse(&["-f", "tags.csv"]);
        let config = RunConfig::merge(&cli, TomlConfig::default());

        assert_eq!(config, RunConfig::new("tags.csv", DEFAULT_OUTPUT_FILE));
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.fetch_mode, FetchMode::Batched);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_per_tag_defaults_to_skip() {
        let cli = parse(&["-f", "tags.csv", "--fetch-mode", "per-tag"]);
        let config = RunConfig::merge(&cli, TomlConfig::default());
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_cli_overrides_settings_file() {
        let settings = TomlConfig::from_toml_str(
            r#"
[api]
token_url = "http://localhost:9000/token"
token_mode = "basic"
fetch_mode = "per-tag"
on_error = "skip"
timeout_seconds = 20
"#,
        )
        .unwrap();
        let cli = parse(&["-f", "tags.csv", "--token-mode", "form", "--on-error", "abort"]);

        let config = RunConfig::merge(&cli, settings);

        assert_eq!(config.token_url, "http://localhost:9000/token");
        assert_eq!(config.token_mode, TokenMode::Form);
        assert_eq!(config.fetch_mode, FetchMode::PerTag);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_validation() {
        let valid = RunConfig::new("tags.csv", "out.csv");
        assert!(valid.validate().is_ok());

        let mut bad_url = valid.clone();
        bad_url.entitlements_url = "${API_HOST}/entitlements".to_string();
        assert!(matches!(
            bad_url.validate(),
            Err(EtlError::InvalidConfigValue { .. })
        ));

        let mut bad_timeout = valid.clone();
        bad_timeout.timeout_seconds = Some(0);
        assert!(bad_timeout.validate().is_err());

        let mut empty_output = valid;
        empty_output.output_path = String::new();
        assert!(empty_output.validate().is_err());
    }
}
