use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Rendered in place of any field the API left out or sent as null.
pub const MISSING_FIELD: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(rename = "serviceTag")]
    pub service_tag: String,
}

impl InputRecord {
    pub fn new(service_tag: impl Into<String>) -> Self {
        Self {
            service_tag: service_tag.into(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// One asset as returned by the entitlement endpoint.
///
/// Fields stay as raw JSON values: the API sends `id` as a number and most
/// other fields as strings, and any of them may be absent or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntitlement {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub service_tag: Option<Value>,
    #[serde(default)]
    pub order_buid: Option<Value>,
    #[serde(default)]
    pub ship_date: Option<Value>,
    #[serde(default)]
    pub product_code: Option<Value>,
    #[serde(default)]
    pub local_channel: Option<Value>,
    #[serde(default)]
    pub product_line_description: Option<Value>,
    #[serde(default)]
    pub product_lob_description: Option<Value>,
    #[serde(default)]
    pub country_code: Option<Value>,
    #[serde(default)]
    pub entitlements: Option<Vec<EntitlementLine>>,
}

impl AssetEntitlement {
    /// A null or missing `entitlements` array counts as empty.
    pub fn entitlement_lines(&self) -> &[EntitlementLine] {
        self.entitlements.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementLine {
    #[serde(default)]
    pub item_number: Option<Value>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default)]
    pub entitlement_type: Option<Value>,
    #[serde(default)]
    pub service_level_code: Option<Value>,
    #[serde(default)]
    pub service_level_description: Option<Value>,
}

/// One report line: an asset's parent fields joined with one entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub id: String,
    pub service_tag: String,
    pub order_buid: String,
    pub ship_date: String,
    pub product_code: String,
    pub local_channel: String,
    pub product_line_description: String,
    pub product_lob_description: String,
    pub country_code: String,
    pub item_number: String,
    pub start_date: String,
    pub end_date: String,
    pub entitlement_type: String,
    pub service_level_code: String,
    pub service_level_description: String,
}

impl OutputRow {
    pub fn as_record(&self) -> [&str; 15] {
        [
            self.id.as_str(),
            self.service_tag.as_str(),
            self.order_buid.as_str(),
            self.ship_date.as_str(),
            self.product_code.as_str(),
            self.local_channel.as_str(),
            self.product_line_description.as_str(),
            self.product_lob_description.as_str(),
            self.country_code.as_str(),
            self.item_number.as_str(),
            self.start_date.as_str(),
            self.end_date.as_str(),
            self.entitlement_type.as_str(),
            self.service_level_code.as_str(),
            self.service_level_description.as_str(),
        ]
    }
}

/// How client credentials reach the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenMode {
    /// `client_id` and `client_secret` as form fields next to `grant_type`.
    #[default]
    Form,
    /// HTTP Basic credentials, only `grant_type` in the body.
    Basic,
}

/// Shape of the entitlement lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// One request with every tag in the `servicetags` query parameter.
    #[default]
    Batched,
    /// One request per tag, path-scoped to that tag.
    PerTag,
}

/// What a failed entitlement request does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    Abort,
    Skip,
}

impl FailurePolicy {
    /// Policy used when none is configured.
    pub fn default_for(mode: FetchMode) -> Self {
        match mode {
            FetchMode::Batched => FailurePolicy::Abort,
            FetchMode::PerTag => FailurePolicy::Skip,
        }
    }
}

macro_rules! impl_mode_str {
    ($ty:ty, $($variant:path => $name:literal),+ $(,)?) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!(
                        "unknown value '{}', expected one of: {}",
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($variant => f.write_str($name),)+
                }
            }
        }
    };
}

impl_mode_str!(TokenMode, TokenMode::Form => "form", TokenMode::Basic => "basic");
impl_mode_str!(FetchMode, FetchMode::Batched => "batched", FetchMode::PerTag => "per-tag");
impl_mode_str!(FailurePolicy, FailurePolicy::Abort => "abort", FailurePolicy::Skip => "skip");
