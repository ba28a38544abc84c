//! OAuth2 client-credentials token exchange.
//!
//! The token endpoint accepts credentials in one of two ways depending on the
//! API variant: as form fields next to `grant_type`, or as HTTP Basic auth with
//! only `grant_type` in the form body. Both are [`TokenExchangeStrategy`]
//! implementations selected by [`TokenMode`].

use crate::config::credentials::Credentials;
use crate::domain::model::{BearerToken, TokenMode};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GRANT_TYPE: &str = "client_credentials";

#[derive(Serialize)]
struct FormCredentialsRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
struct GrantOnlyRequest<'a> {
    grant_type: &'a str,
}

/// The fields we read from the token response; anything else is ignored.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[async_trait]
pub trait TokenExchangeStrategy: Send + Sync {
    fn mode(&self) -> TokenMode;

    async fn exchange(&self, client: &Client, credentials: &Credentials) -> Result<BearerToken>;
}

pub struct FormCredentialsExchange {
    token_url: String,
}

impl FormCredentialsExchange {
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
        }
    }
}

#[async_trait]
impl TokenExchangeStrategy for FormCredentialsExchange {
    fn mode(&self) -> TokenMode {
        TokenMode::Form
    }

    async fn exchange(&self, client: &Client, credentials: &Credentials) -> Result<BearerToken> {
        let body = FormCredentialsRequest {
            grant_type: GRANT_TYPE,
            client_id: credentials.client_id(),
            client_secret: credentials.client_secret(),
        };

        tracing::debug!("Requesting access token from: {}", self.token_url);
        let response = client.post(&self.token_url).form(&body).send().await?;
        read_token(response).await
    }
}

pub struct BasicAuthExchange {
    token_url: String,
}

impl BasicAuthExchange {
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
        }
    }
}

#[async_trait]
impl TokenExchangeStrategy for BasicAuthExchange {
    fn mode(&self) -> TokenMode {
        TokenMode::Basic
    }

    async fn exchange(&self, client: &Client, credentials: &Credentials) -> Result<BearerToken> {
        tracing::debug!(
            "Requesting access token (basic auth) from: {}",
            self.token_url
        );
        let response = client
            .post(&self.token_url)
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .form(&GrantOnlyRequest {
                grant_type: GRANT_TYPE,
            })
            .send()
            .await?;
        read_token(response).await
    }
}

pub fn token_exchange_for(mode: TokenMode, token_url: &str) -> Box<dyn TokenExchangeStrategy> {
    match mode {
        TokenMode::Form => Box::new(FormCredentialsExchange::new(token_url)),
        TokenMode::Basic => Box::new(BasicAuthExchange::new(token_url)),
    }
}

/// Reads the body before checking the status so the gateway's error text
/// ends up in the diagnostic.
async fn read_token(response: reqwest::Response) -> Result<BearerToken> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(EtlError::authentication(Some(status), body));
    }

    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|e| EtlError::Authentication {
            status: Some(status),
            message: "malformed token response".to_string(),
            source: Some(Box::new(e)),
        })?;

    match parsed.access_token {
        Some(token) if !token.trim().is_empty() => {
            tracing::debug!(
                "Access token issued (type: {}, expires in: {:?}s)",
                parsed.token_type.as_deref().unwrap_or("unknown"),
                parsed.expires_in
            );
            Ok(BearerToken::new(token))
        }
        _ => Err(EtlError::authentication(Some(status), "no token issued")),
    }
}
