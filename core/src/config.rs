//! Gateway connection settings.

use std::time::Duration;

use crate::error::ApiError;

pub const SANDBOX_URL: &str = "https://gateway.sandbox.fatzebra.com.au";
pub const PRODUCTION_URL: &str = "https://gateway.fatzebra.com.au";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoint selection for a `Gateway`.
///
/// `sandbox` picks the default base URL and is sent as the `test` flag on
/// every write; `base_url`, when set, overrides the default.
#[derive(Clone)]
pub struct GatewayConfig {
    pub username: String,
    pub token: String,
    pub sandbox: bool,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            sandbox: true,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The URL requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        let url = match &self.base_url {
            Some(url) => url.as_str(),
            None if self.sandbox => SANDBOX_URL,
            None => PRODUCTION_URL,
        };
        url.trim_end_matches('/')
    }

    /// Read settings from `FATZEBRA_USERNAME`, `FATZEBRA_TOKEN`,
    /// `FATZEBRA_SANDBOX`, `FATZEBRA_GATEWAY_URL` and `FATZEBRA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::Configuration(format!("{key} environment variable is required")))
        };

        let mut config = Self::new(required("FATZEBRA_USERNAME")?, required("FATZEBRA_TOKEN")?);

        if let Some(raw) = lookup("FATZEBRA_SANDBOX") {
            config.sandbox = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ApiError::Configuration(format!(
                        "FATZEBRA_SANDBOX must be true or false, got {other:?}"
                    )))
                }
            };
        }

        config.base_url = lookup("FATZEBRA_GATEWAY_URL").filter(|v| !v.is_empty());

        if let Some(raw) = lookup("FATZEBRA_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::Configuration(format!("FATZEBRA_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })?;
            if secs == 0 {
                return Err(ApiError::Configuration(
                    "FATZEBRA_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("username", &self.username)
            .field("token", &"***")
            .field("sandbox", &self.sandbox)
            .field("base_url", &self.base_url())
            .field("timeout", &self.timeout)
            .finish()
    }
}
