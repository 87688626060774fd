use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitesRead {
    pub sites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetToken {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedUrl {
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
}

/// Query string shared by the per-site proxy routes.
#[derive(Debug, Deserialize)]
pub struct SiteQuery {
    #[serde(rename = "siteId")]
    pub site_id: String,
}
