use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use mingle_types::api::{Claims, CountersResponse};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CountersResponse>, ApiError> {
    counters_for(state, claims.sub)
}

pub async fn for_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CountersResponse>, ApiError> {
    counters_for(state, id)
}

fn counters_for(state: AppState, user: Uuid) -> Result<Json<CountersResponse>, ApiError> {
    let id = user.to_string();
    Ok(Json(CountersResponse {
        following: state.db.count_following(&id)?,
        followed: state.db.count_followers(&id)?,
        publications: state.db.count_publications_by_author(&id)?,
    }))
}
