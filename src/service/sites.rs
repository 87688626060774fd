use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::db::{DbSite, DbUser, Storage};
use crate::error::OpenpackError;
use crate::ivion::SiteUser;
use crate::types::user::{SiteCreate, SiteCredentials, SiteRead};

#[derive(Clone)]
pub struct SiteService {
    storage: Storage,
}

impl SiteService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn add(&self, input: SiteCreate) -> Result<SiteRead, OpenpackError> {
        if input.name.trim().is_empty() {
            return Err(OpenpackError::InvalidInput(
                "site name must not be empty".to_string(),
            ));
        }
        let instance_url = normalize_instance_url(&input.instance_url)?;
        let site = self
            .storage
            .insert_site(input.name, instance_url, input.ivion_id)
            .await?;
        info!(site_id = %site.id, instance_url = %site.instance_url, "site created");
        Ok(site.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<SiteRead, OpenpackError> {
        self.require_site(id).await.map(Into::into)
    }

    /// Site joined with its first linked user, as exposed to admins.
    pub async fn credentials(&self, id: Uuid) -> Result<SiteCredentials, OpenpackError> {
        let site_user = self.site_user(id).await?;
        Ok(SiteCredentials {
            site_id: site_user.site_id,
            user_id: site_user.user_id,
            ivion_id: site_user.ivion_id,
            instance_url: site_user.instance_url,
            ivion_username: site_user.ivion_username,
        })
    }

    /// Vendor credential bundle for a site, taken from its first linked user.
    pub async fn site_user(&self, id: Uuid) -> Result<SiteUser, OpenpackError> {
        let site = self.require_site(id).await?;
        let user = self
            .storage
            .first_user_of_site(id)
            .await?
            .ok_or_else(|| OpenpackError::NotFound(format!("site {id} has no linked user")))?;
        Ok(site_user(&site, user))
    }

    async fn require_site(&self, id: Uuid) -> Result<DbSite, OpenpackError> {
        self.storage
            .get_site(id)
            .await?
            .ok_or_else(|| OpenpackError::NotFound(format!("site {id} not found")))
    }
}

/// Pair a site with a user's vendor credentials.
pub(crate) fn site_user(site: &DbSite, user: DbUser) -> SiteUser {
    SiteUser {
        site_id: site.id,
        user_id: user.id,
        ivion_id: site.ivion_id.clone(),
        instance_url: site.instance_url.clone(),
        ivion_username: user.ivion_username,
        ivion_password: user.ivion_password,
    }
}

/// Instance URLs must be absolute http(s) URLs; stored without a trailing slash.
fn normalize_instance_url(raw: &str) -> Result<String, OpenpackError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| OpenpackError::InvalidInput(format!("invalid instance_url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(OpenpackError::InvalidInput(format!(
            "instance_url must be http or https, got `{}`",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
