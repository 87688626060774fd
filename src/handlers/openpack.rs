use axum::{
    Json,
    extract::{Query, State},
};

use crate::ivion::VendorResponse;
use crate::middleware::auth::RequireOpenpackToken;
use crate::router::AppState;
use crate::types::openpack::{GetToken, SignedUrl, SiteQuery, SitesRead};
use crate::OpenpackError;

/// GET /openpack/sites
pub async fn get_sites(
    _auth: RequireOpenpackToken,
    State(state): State<AppState>,
) -> Result<Json<SitesRead>, OpenpackError> {
    Ok(Json(state.openpack().get_sites().await?))
}

/// GET /openpack/auth
pub async fn get_token(
    _auth: RequireOpenpackToken,
    State(state): State<AppState>,
) -> Result<Json<GetToken>, OpenpackError> {
    Ok(Json(state.openpack().get_token().await?))
}

/// GET /openpack/siteInfo?siteId=
pub async fn get_site_info(
    _auth: RequireOpenpackToken,
    State(state): State<AppState>,
    Query(query): Query<SiteQuery>,
) -> Result<Json<VendorResponse>, OpenpackError> {
    Ok(Json(state.openpack().site_info(&query.site_id).await?))
}

/// GET /openpack/sitePois?siteId=
pub async fn get_site_pois(
    _auth: RequireOpenpackToken,
    State(state): State<AppState>,
    Query(query): Query<SiteQuery>,
) -> Result<Json<VendorResponse>, OpenpackError> {
    Ok(Json(state.openpack().site_pois(&query.site_id).await?))
}

/// GET /openpack/access?siteId=
pub async fn get_signed_url(
    _auth: RequireOpenpackToken,
    State(state): State<AppState>,
    Query(query): Query<SiteQuery>,
) -> Result<Json<SignedUrl>, OpenpackError> {
    Ok(Json(state.openpack().signed_url(&query.site_id).await?))
}

/// GET /openpack/siteList -> vendor `GET /api/sites`
pub async fn get_vendor_sites(
    _auth: RequireOpenpackToken,
    State(state): State<AppState>,
) -> Result<Json<VendorResponse>, OpenpackError> {
    Ok(Json(state.openpack().vendor_sites().await?))
}
