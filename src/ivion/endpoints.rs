use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::OpenpackError;
use crate::ivion::types::{LoginPayload, SiteUser, VendorResponse};

const GENERATE_TOKENS_PATH: &[&str] = &["api", "auth", "generate_tokens"];
const SITES_PATH: &[&str] = &["api", "sites"];
const AUTH_HEADER: &str = "X-Authorization";

/// Stateless IVION endpoints. Every call is a single attempt; callers get the
/// vendor status back on failure.
pub struct IvionEndpoints;

impl IvionEndpoints {
    /// Exchange the stored credentials for a token payload.
    pub async fn generate_tokens(
        http_client: &reqwest::Client,
        site_user: &SiteUser,
    ) -> Result<VendorResponse, OpenpackError> {
        let url = endpoint(&site_user.instance_url, GENERATE_TOKENS_PATH)?;
        let resp = http_client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&LoginPayload::from(site_user))
            .send()
            .await?;
        info!(
            site_id = %site_user.site_id,
            status = resp.status().as_u16(),
            "POST {}",
            url
        );
        read_success(resp).await
    }

    /// `GET /api/sites`
    pub async fn list_sites(
        http_client: &reqwest::Client,
        instance_url: &str,
        access_token: &str,
    ) -> Result<VendorResponse, OpenpackError> {
        let url = endpoint(instance_url, SITES_PATH)?;
        Self::get(http_client, url, access_token).await
    }

    /// `GET /api/sites/{id}`
    pub async fn site_detail(
        http_client: &reqwest::Client,
        instance_url: &str,
        access_token: &str,
        site_id: &str,
    ) -> Result<VendorResponse, OpenpackError> {
        let url = endpoint(instance_url, &["api", "sites", site_id])?;
        Self::get(http_client, url, access_token).await
    }

    /// `GET /api/site/{id}/pois`
    pub async fn site_pois(
        http_client: &reqwest::Client,
        instance_url: &str,
        access_token: &str,
        site_id: &str,
    ) -> Result<VendorResponse, OpenpackError> {
        let url = endpoint(instance_url, &["api", "site", site_id, "pois"])?;
        Self::get(http_client, url, access_token).await
    }

    async fn get(
        http_client: &reqwest::Client,
        url: Url,
        access_token: &str,
    ) -> Result<VendorResponse, OpenpackError> {
        let resp = http_client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_HEADER, format!("Bearer {access_token}"))
            .send()
            .await?;
        debug!(status = resp.status().as_u16(), "GET {}", url);
        read_success(resp).await
    }
}

/// Append percent-encoded path segments to a stored instance URL.
/// A caller-supplied id always stays a single segment.
fn endpoint(instance_url: &str, segments: &[&str]) -> Result<Url, OpenpackError> {
    let invalid = |reason: String| OpenpackError::Config(format!("instance_url `{instance_url}`: {reason}"));
    let mut url = Url::parse(instance_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn read_success(resp: reqwest::Response) -> Result<VendorResponse, OpenpackError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "IVION rejected request");
        return Err(OpenpackError::vendor_status(status, &body));
    }
    VendorResponse::read(resp).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://core.iv.example/", GENERATE_TOKENS_PATH)
                .unwrap()
                .as_str(),
            "https://core.iv.example/api/auth/generate_tokens"
        );
        assert_eq!(
            endpoint("https://core.iv.example", &["api", "site", "7", "pois"])
                .unwrap()
                .as_str(),
            "https://core.iv.example/api/site/7/pois"
        );
        assert_eq!(
            endpoint("https://host.example/ivion/", SITES_PATH).unwrap().as_str(),
            "https://host.example/ivion/api/sites"
        );
    }

    #[test]
    fn site_id_stays_one_encoded_segment() {
        assert_eq!(
            endpoint("https://core.iv.example", &["api", "sites", "../auth/x"])
                .unwrap()
                .as_str(),
            "https://core.iv.example/api/sites/..%2Fauth%2Fx"
        );
        assert_eq!(
            endpoint("https://core.iv.example", &["api", "sites", "a?b=c#d"])
                .unwrap()
                .as_str(),
            "https://core.iv.example/api/sites/a%3Fb=c%23d"
        );
    }

    #[test]
    fn unparsable_instance_url_is_rejected() {
        assert!(matches!(
            endpoint("not a url", SITES_PATH),
            Err(OpenpackError::Config(_))
        ));
    }
}
