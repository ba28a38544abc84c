use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Dotenv file read from the working directory at startup.
pub const DOTENV_FILE: &str = ".env";

/// Environment variables checked for the client identifier, in order.
pub const CLIENT_ID_VARS: [&str; 2] = ["DELL_CLIENT_ID", "client_id"];
/// Environment variables checked for the client secret, in order.
pub const CLIENT_SECRET_VARS: [&str; 2] = ["DELL_CLIENT_SECRET", "client_secret"];

/// OAuth2 client credentials, built once at startup and handed to the
/// pipeline. Never logged: `Debug` masks the secret.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Process environment first, then the dotenv file at `path`. A missing
    /// file is not an error.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup_and_file(|name| std::env::var(name).ok(), path)
    }

    pub fn from_lookup_and_file<F>(lookup: F, path: impl AsRef<Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_dotenv(path.as_ref())?;
        Self::from_lookup(|name| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| file_vars.get(name).cloned())
        })
    }

    /// Resolves both values through `lookup`; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let find = |names: &[&str]| {
            names
                .iter()
                .copied()
                .filter_map(|name| lookup(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let client_id = find(&CLIENT_ID_VARS).ok_or_else(|| EtlError::Configuration {
            field: "client_id".to_string(),
            message: format!("set one of {}", CLIENT_ID_VARS.join(", ")),
        })?;
        let client_secret = find(&CLIENT_SECRET_VARS).ok_or_else(|| EtlError::Configuration {
            field: "client_secret".to_string(),
            message: format!("set one of {}", CLIENT_SECRET_VARS.join(", ")),
        })?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let dotenv_error = |e: dotenvy::Error| EtlError::Configuration {
        field: path.display().to_string(),
        message: format!("cannot read dotenv file: {}", e),
    };

    match dotenvy::from_path_iter(path) {
        Ok(iter) => {
            let vars = iter
                .collect::<std::result::Result<HashMap<_, _>, _>>()
                .map_err(dotenv_error)?;
            tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
            Ok(vars)
        }
        Err(e) if e.not_found() => {
            tracing::debug!("No dotenv file at {}", path.display());
            Ok(HashMap::new())
        }
        Err(e) => Err(dotenv_error(e)),
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}
