use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header::AUTHORIZATION, request::Parts};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::OpenpackError;
use crate::router::AppState;

const TOKEN_PREFIX: &str = "Token ";

/// Ensure the inbound request carries `Authorization: Token <expected>`.
pub fn ensure_token(headers: &HeaderMap, expected: &str) -> Result<(), OpenpackError> {
    let Some(raw) = headers.get(AUTHORIZATION) else {
        return Err(OpenpackError::Forbidden("Authorization header missing"));
    };
    let Some(token) = raw
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(TOKEN_PREFIX))
    else {
        return Err(OpenpackError::Forbidden(
            "Invalid token format. Use 'Token <value>'",
        ));
    };
    if !bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(OpenpackError::Forbidden("Invalid or missing token"));
    }
    Ok(())
}

/// A protection tier: which configured secret a route accepts.
pub trait Tier: Send + Sync + 'static {
    fn secret(cfg: &Config) -> &str;
}

pub struct ApiTier;
pub struct AdminTier;
pub struct OpenpackTier;

impl Tier for ApiTier {
    fn secret(cfg: &Config) -> &str {
        &cfg.api_token
    }
}

impl Tier for AdminTier {
    fn secret(cfg: &Config) -> &str {
        &cfg.admin_token
    }
}

impl Tier for OpenpackTier {
    fn secret(cfg: &Config) -> &str {
        &cfg.openpack_token
    }
}

/// Extractor guarding a handler with the secret of tier `T`.
/// Place it first so it runs before any other extractor.
pub struct RequireToken<T: Tier>(PhantomData<T>);

pub type RequireApiToken = RequireToken<ApiTier>;
pub type RequireAdminToken = RequireToken<AdminTier>;
pub type RequireOpenpackToken = RequireToken<OpenpackTier>;

impl<T: Tier> FromRequestParts<AppState> for RequireToken<T> {
    type Rejection = OpenpackError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        ensure_token(&parts.headers, T::secret(&state.config))?;
        Ok(Self(PhantomData))
    }
}
