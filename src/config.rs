//! Process-wide settings read once at startup.

use std::env;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://affiliateapi7643.agoda.com/affiliateservice/lt_v1";
pub const DEFAULT_VENDOR_DOMAIN: &str = "agoda.com";
pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_ADULTS: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API credentials not found: set {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Static vendor credentials plus endpoint
#[derive(Clone)]
pub struct ApiCredentials {
    pub site_id: String,
    pub api_key: String,
    pub endpoint: String,
}

impl ApiCredentials {
    pub fn new(site_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            api_key: api_key.into(),
            endpoint: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("{}:{}", self.site_id, self.api_key)
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("site_id", &self.site_id)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Option<ApiCredentials>,
    pub currency: String,
    pub adults: u32,
    pub vendor_domain: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: None,
            currency: DEFAULT_CURRENCY.to_string(),
            adults: DEFAULT_ADULTS,
            vendor_domain: DEFAULT_VENDOR_DOMAIN.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credentials = match (get("AGODA_SITE_ID"), get("AGODA_API_KEY")) {
            (Some(site_id), Some(api_key)) => {
                let creds = ApiCredentials::new(site_id, api_key);
                Some(match get("AGODA_API_URL") {
                    Some(endpoint) => creds.with_endpoint(endpoint),
                    None => creds,
                })
            }
            _ => None,
        };

        let adults = match get("VERIFIER_ADULTS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "VERIFIER_ADULTS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_ADULTS,
        };

        Ok(Self {
            credentials,
            currency: get("VERIFIER_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            adults,
            vendor_domain: get("VERIFIER_VENDOR_DOMAIN")
                .map(|d| d.to_lowercase())
                .unwrap_or_else(|| DEFAULT_VENDOR_DOMAIN.to_string()),
        })
    }

    /// Credentials, or the error naming what is missing
    pub fn require_credentials(&self) -> Result<&ApiCredentials, ConfigError> {
        self.credentials
            .as_ref()
            .ok_or(ConfigError::MissingVar("AGODA_SITE_ID and AGODA_API_KEY"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.credentials.is_none());
        assert_eq!(config.currency, "INR");
        assert_eq!(config.adults, 2);
        assert_eq!(config.vendor_domain, "agoda.com");
        assert!(config.require_credentials().is_err());
    }

    #[test]
    fn reads_credentials_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AGODA_SITE_ID", "1234"),
            ("AGODA_API_KEY", "secret"),
            ("AGODA_API_URL", "http://localhost:9000/lt"),
            ("VERIFIER_CURRENCY", "usd"),
            ("VERIFIER_ADULTS", "3"),
        ]))
        .unwrap();

        let creds = config.require_credentials().unwrap();
        assert_eq!(creds.authorization(), "1234:secret");
        assert_eq!(creds.endpoint, "http://localhost:9000/lt");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.adults, 3);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let creds = ApiCredentials::new("1234", "secret");
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn rejects_bad_party_size() {
        let err = Config::from_lookup(lookup(&[("VERIFIER_ADULTS", "zero")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "VERIFIER_ADULTS", .. }));
    }
}
