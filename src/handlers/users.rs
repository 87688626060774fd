use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::middleware::auth::RequireApiToken;
use crate::router::AppState;
use crate::types::user::{UserCreate, UserRead};
use crate::OpenpackError;

/// POST /user/signup
pub async fn register_user(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    Json(input): Json<UserCreate>,
) -> Result<Json<UserRead>, OpenpackError> {
    Ok(Json(state.users().add(input).await?))
}

/// GET /user/{id}
pub async fn get_user(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRead>, OpenpackError> {
    Ok(Json(state.users().get(id).await?))
}
