use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::middleware::auth::{RequireAdminToken, RequireApiToken};
use crate::router::AppState;
use crate::types::user::{SiteCreate, SiteCredentials, SiteRead};
use crate::OpenpackError;

/// POST /site (admin)
pub async fn create_site(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(input): Json<SiteCreate>,
) -> Result<Json<SiteRead>, OpenpackError> {
    Ok(Json(state.sites().add(input).await?))
}

/// GET /site/{id}
pub async fn get_site(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SiteRead>, OpenpackError> {
    Ok(Json(state.sites().get(id).await?))
}

/// GET /site/{id}/credentials (admin)
pub async fn get_site_credentials(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SiteCredentials>, OpenpackError> {
    Ok(Json(state.sites().credentials(id).await?))
}
