use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{DbSession, Storage};
use crate::error::OpenpackError;
use crate::ivion::{IvionEndpoints, SiteUser, VendorResponse};
use crate::service::sites::site_user;
use crate::types::openpack::{GetToken, SignedUrl, SitesRead};

/// The single local account every Openpack call runs as.
#[derive(Debug, Clone)]
pub struct ProxyAccount {
    pub username: String,
    pub site_id: Option<Uuid>,
    pub portal_login_url: String,
}

impl From<&Config> for ProxyAccount {
    fn from(cfg: &Config) -> Self {
        Self {
            username: cfg.openpack_username.clone(),
            site_id: cfg.openpack_site_id,
            portal_login_url: cfg.portal_login_url.clone(),
        }
    }
}

/// Proxies IVION logins and reads on behalf of the configured account.
///
/// Every operation logs in again: session rows are written for audit and
/// never read back.
#[derive(Clone)]
pub struct OpenpackService {
    storage: Storage,
    http_client: reqwest::Client,
    account: ProxyAccount,
}

impl OpenpackService {
    pub fn new(storage: Storage, http_client: reqwest::Client, account: ProxyAccount) -> Self {
        Self {
            storage,
            http_client,
            account,
        }
    }

    /// Look up the proxy account's vendor credentials and the site they are used on.
    pub async fn resolve_credentials(&self) -> Result<SiteUser, OpenpackError> {
        let username = self.account.username.as_str();
        let user = self
            .storage
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| OpenpackError::NotFound(format!("proxy account `{username}` not found")))?;

        let site = match self.account.site_id {
            Some(id) => self
                .storage
                .get_site(id)
                .await?
                .ok_or_else(|| OpenpackError::NotFound(format!("site {id} not found")))?,
            None => self
                .storage
                .sites_of_user(user.id)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    OpenpackError::NotFound(format!(
                        "proxy account `{username}` has no linked site"
                    ))
                })?,
        };
        Ok(site_user(&site, user))
    }

    /// Log in to the vendor and record the exchange as a new session row.
    pub async fn generate_session(&self, site_user: &SiteUser) -> Result<DbSession, OpenpackError> {
        self.exchange(site_user)
            .await
            .map_err(OpenpackError::into_session_failure)
    }

    async fn exchange(&self, site_user: &SiteUser) -> Result<DbSession, OpenpackError> {
        let resp = IvionEndpoints::generate_tokens(&self.http_client, site_user).await?;
        let data = resp.json.unwrap_or_else(|| Value::Object(Map::new()));
        let session = DbSession::new(site_user.user_id, site_user.site_id, data);
        self.storage.insert_session(&session).await?;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            site_id = %session.site_id,
            "vendor session stored"
        );
        Ok(session)
    }

    /// Site ids the account may read, taken from the login payload's group grants.
    pub async fn get_sites(&self) -> Result<SitesRead, OpenpackError> {
        let site_user = self.resolve_credentials().await?;
        let session = self.generate_session(&site_user).await?;
        Ok(SitesRead {
            sites: site_ids_from_payload(&session.data),
        })
    }

    pub async fn get_token(&self) -> Result<GetToken, OpenpackError> {
        let (_, tokens) = self.login().await?;
        Ok(tokens)
    }

    pub async fn vendor_sites(&self) -> Result<VendorResponse, OpenpackError> {
        let (site_user, tokens) = self.login().await?;
        IvionEndpoints::list_sites(
            &self.http_client,
            &site_user.instance_url,
            &tokens.access_token,
        )
        .await
        .map_err(OpenpackError::into_session_failure)
    }

    pub async fn site_info(&self, site_id: &str) -> Result<VendorResponse, OpenpackError> {
        require_site_id(site_id)?;
        let (site_user, tokens) = self.login().await?;
        IvionEndpoints::site_detail(
            &self.http_client,
            &site_user.instance_url,
            &tokens.access_token,
            site_id,
        )
        .await
        .map_err(OpenpackError::into_session_failure)
    }

    pub async fn site_pois(&self, site_id: &str) -> Result<VendorResponse, OpenpackError> {
        require_site_id(site_id)?;
        let (site_user, tokens) = self.login().await?;
        IvionEndpoints::site_pois(
            &self.http_client,
            &site_user.instance_url,
            &tokens.access_token,
            site_id,
        )
        .await
        .map_err(OpenpackError::into_session_failure)
    }

    /// Single sign-on link into the vendor web UI.
    pub async fn signed_url(&self, site_id: &str) -> Result<SignedUrl, OpenpackError> {
        let (site_user, tokens) = self.login().await?;
        Ok(SignedUrl {
            signed_url: compose_signed_url(
                &self.account.portal_login_url,
                &site_user.instance_url,
                &tokens,
                site_id,
            ),
        })
    }

    async fn login(&self) -> Result<(SiteUser, GetToken), OpenpackError> {
        let site_user = self.resolve_credentials().await?;
        let session = self.generate_session(&site_user).await?;
        let tokens = tokens_from_payload(&session.data)?;
        debug!(session_id = %session.id, "access token obtained");
        Ok((site_user, tokens))
    }
}

/// A site id is sent as one path segment; empty and dot segments would address another endpoint.
fn require_site_id(site_id: &str) -> Result<(), OpenpackError> {
    if matches!(site_id, "" | "." | "..") {
        return Err(OpenpackError::InvalidInput(format!(
            "invalid siteId `{site_id}`"
        )));
    }
    Ok(())
}

fn tokens_from_payload(data: &Value) -> Result<GetToken, OpenpackError> {
    let field = |name: &str| {
        data.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| OpenpackError::Session(format!("vendor payload has no `{name}`")))
    };
    Ok(GetToken {
        access_token: field("access_token")?,
        refresh_token: field("refresh_token")?,
    })
}

fn site_ids_from_payload(data: &Value) -> Vec<String> {
    data.pointer("/principal/site_default_group_read")
        .and_then(Value::as_object)
        .map(|sites| sites.keys().cloned().collect())
        .unwrap_or_default()
}

/// The portal URL and token values are concatenated verbatim; the portal expects them unescaped.
fn compose_signed_url(portal: &str, instance_url: &str, tokens: &GetToken, site_id: &str) -> String {
    format!(
        "{portal}?autologin=true&InstanceUrl={instance}/&access_token={access}&refresh_token={refresh}&siteId={site_id}",
        instance = instance_url.trim_end_matches('/'),
        access = tokens.access_token,
        refresh = tokens.refresh_token,
    )
}
