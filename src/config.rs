use figment::{Figment, providers::Env};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::error::OpenpackError;

const ENV_KEYS: &[&str] = &[
    "listen_addr",
    "database_url",
    "loglevel",
    "api_token",
    "admin_token",
    "openpack_token",
    "jwt_secret",
    "jwt_algorithm",
    "openpack_username",
    "openpack_site_id",
    "vendor_timeout_secs",
    "portal_login_url",
];

const JWT_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Process configuration, read from the environment (and `.env`, loaded by `main`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,

    /// Secret for the general API tier (`/user`, `GET /site`).
    pub api_token: String,
    /// Secret for the admin tier (site management).
    pub admin_token: String,
    /// Secret for the `/openpack` proxy tier.
    pub openpack_token: String,

    // Reserved for the service's own login tokens; not issued yet.
    pub jwt_secret: String,
    pub jwt_algorithm: String,

    /// Local account whose vendor credentials back every proxied call.
    pub openpack_username: String,
    /// Site used for proxied calls. Falls back to the account's first linked site.
    pub openpack_site_id: Option<Uuid>,

    pub vendor_timeout_secs: u64,
    /// Vendor web UI login page. Used verbatim as the prefix of signed URLs.
    pub portal_login_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://openpack.db".to_string(),
            loglevel: "info".to_string(),
            api_token: String::new(),
            admin_token: String::new(),
            openpack_token: String::new(),
            jwt_secret: String::new(),
            jwt_algorithm: "HS256".to_string(),
            openpack_username: "dfre".to_string(),
            openpack_site_id: None,
            vendor_timeout_secs: 10,
            portal_login_url: "https://core.factory360.world/login".to_string(),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables and validate it.
    pub fn from_env() -> Result<Self, OpenpackError> {
        let cfg: Config = Figment::new()
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|e| OpenpackError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), OpenpackError> {
        for (name, value) in [
            ("API_TOKEN", &self.api_token),
            ("ADMIN_TOKEN", &self.admin_token),
            ("OPENPACK_TOKEN", &self.openpack_token),
        ] {
            if value.trim().is_empty() {
                return Err(OpenpackError::Config(format!("{name} must be set")));
            }
        }
        if !JWT_ALGORITHMS.contains(&self.jwt_algorithm.as_str()) {
            return Err(OpenpackError::Config(format!(
                "unsupported JWT_ALGORITHM `{}`",
                self.jwt_algorithm
            )));
        }
        if self.openpack_username.trim().is_empty() {
            return Err(OpenpackError::Config(
                "OPENPACK_USERNAME must not be empty".to_string(),
            ));
        }
        if let Err(e) = Url::parse(&self.portal_login_url) {
            return Err(OpenpackError::Config(format!(
                "PORTAL_LOGIN_URL `{}` is not a valid URL: {e}",
                self.portal_login_url
            )));
        }
        if self.vendor_timeout_secs == 0 {
            return Err(OpenpackError::Config(
                "VENDOR_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_secs(self.vendor_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_tokens() -> Config {
        Config {
            api_token: "api".into(),
            admin_token: "admin".into(),
            openpack_token: "op".into(),
            ..Config::default()
        }
    }

    #[test]
    fn defaults_match_vendor_integration() {
        let cfg = Config::default();
        assert_eq!(cfg.vendor_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.openpack_username, "dfre");
        assert_eq!(cfg.portal_login_url, "https://core.factory360.world/login");
        assert!(cfg.openpack_site_id.is_none());
    }

    #[test]
    fn missing_tier_secret_is_rejected() {
        let cfg = Config {
            admin_token: " ".into(),
            ..with_tokens()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("ADMIN_TOKEN"));
    }

    #[test]
    fn unknown_jwt_algorithm_is_rejected() {
        let cfg = Config {
            jwt_algorithm: "none".into(),
            ..with_tokens()
        };
        assert!(matches!(cfg.validate(), Err(OpenpackError::Config(_))));
        assert!(with_tokens().validate().is_ok());
    }

    #[test]
    fn portal_url_is_validated_but_kept_as_given() {
        let cfg = Config {
            portal_login_url: "https://portal.example".into(),
            ..with_tokens()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.portal_login_url, "https://portal.example");

        let cfg = Config {
            portal_login_url: "portal".into(),
            ..with_tokens()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("PORTAL_LOGIN_URL"));
    }
}
