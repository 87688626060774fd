use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Lifetime recorded on every session row, independent of the vendor token expiry.
pub const SESSION_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct DbUser {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub ivion_username: String,
    pub ivion_password: String,
    pub hashed_password: String,
}

/// Fields needed to insert a user; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub ivion_username: String,
    pub ivion_password: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbSite {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub instance_url: String,
    pub ivion_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Stored in the `expering_at` column.
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub site_id: Uuid,
    pub data: Value,
}

impl DbSession {
    /// A fresh session row created now, expiring after [`SESSION_LIFETIME_SECS`].
    pub fn new(user_id: Uuid, site_id: Uuid, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::seconds(SESSION_LIFETIME_SECS),
            user_id,
            site_id,
            data,
        }
    }
}
