use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DbSite, DbUser};

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub ivion_username: String,
    pub ivion_password: String,
    #[serde(default)]
    pub site_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRead {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub sites: Vec<SiteRead>,
}

impl UserRead {
    pub fn new(user: DbUser, sites: Vec<DbSite>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            sites: sites.into_iter().map(SiteRead::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteCreate {
    pub name: String,
    pub instance_url: String,
    pub ivion_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRead {
    pub id: Uuid,
    pub name: String,
    pub instance_url: String,
    pub ivion_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbSite> for SiteRead {
    fn from(s: DbSite) -> Self {
        Self {
            id: s.id,
            name: s.name,
            instance_url: s.instance_url,
            ivion_id: s.ivion_id,
            created_at: s.created_at,
        }
    }
}

/// Site joined with the user whose vendor credentials serve it. The vendor
/// password never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteCredentials {
    pub site_id: Uuid,
    pub user_id: Uuid,
    pub ivion_id: String,
    pub instance_url: String,
    pub ivion_username: String,
}
