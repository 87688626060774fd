use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{NewUser, Storage};
use crate::error::OpenpackError;
use crate::service::password::hash_password;
use crate::types::user::{UserCreate, UserRead};

#[derive(Clone)]
pub struct UserService {
    storage: Storage,
}

impl UserService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a user, link the requested sites that exist, and return the user with its sites.
    /// Unknown site ids are logged and skipped.
    pub async fn add(&self, input: UserCreate) -> Result<UserRead, OpenpackError> {
        if input.username.trim().is_empty() {
            return Err(OpenpackError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(OpenpackError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let hashed_password = hash_password(&input.password)?;
        let user = self
            .storage
            .insert_user(NewUser {
                username: input.username.clone(),
                ivion_username: input.ivion_username,
                ivion_password: input.ivion_password,
                hashed_password,
            })
            .await
            .map_err(|e| match e {
                OpenpackError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    OpenpackError::Conflict(format!("username `{}` already exists", input.username))
                }
                other => other,
            })?;
        info!(user_id = %user.id, username = %user.username, "user created");

        if input.site_ids.is_empty() {
            debug!(user_id = %user.id, "no sites to associate");
        } else {
            let linked = self.link_sites(user.id, &input.site_ids).await?;
            info!(user_id = %user.id, linked, "site associations added");
        }

        self.get(user.id).await
    }

    /// Fetch a user with its linked sites.
    pub async fn get(&self, id: Uuid) -> Result<UserRead, OpenpackError> {
        let user = self
            .storage
            .get_user(id)
            .await?
            .ok_or_else(|| OpenpackError::NotFound(format!("user {id} not found")))?;
        let sites = self.storage.sites_of_user(id).await?;
        Ok(UserRead::new(user, sites))
    }

    async fn link_sites(&self, user_id: Uuid, site_ids: &[Uuid]) -> Result<u64, OpenpackError> {
        let mut requested = Vec::with_capacity(site_ids.len());
        let mut seen = HashSet::new();
        for id in site_ids {
            if seen.insert(*id) {
                requested.push(*id);
            }
        }

        let existing = self.storage.existing_site_ids(&requested).await?;
        let existing_set: HashSet<Uuid> = existing.iter().copied().collect();
        let missing: Vec<Uuid> = requested
            .iter()
            .filter(|id| !existing_set.contains(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            warn!(user_id = %user_id, ?missing, "skipping unknown site ids");
        }
        if existing.is_empty() {
            return Ok(0);
        }
        self.storage.link_sites(user_id, &existing).await
    }
}
