use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use mingle_types::api::{Claims, Paginated, UserWithRelations};
use mingle_types::models::UserProfile;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::pagination::{Pager, paginate};
use crate::relations::resolve_relations;
use crate::user_profile;

/// Profile view, decorated with the caller's relation to the target.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<UserWithRelations>, ApiError> {
    let user_id: Uuid = id
        .parse()
        .map_err(|_| ApiError::Validation("user id is not a valid identifier".into()))?;

    let row = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(ApiError::NotFound("user"))?;

    let relations = resolve_relations(&state.db, &claims.sub)?;

    Ok(Json(UserWithRelations {
        user: user_profile(row),
        following: relations.following.contains(&user_id),
        followed: relations.followed.contains(&user_id),
    }))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Paginated<UserProfile>>, ApiError> {
    users_page(state, None).await
}

pub async fn list_page(
    State(state): State<AppState>,
    Path(page): Path<u64>,
) -> Result<Json<Paginated<UserProfile>>, ApiError> {
    users_page(state, Some(page)).await
}

async fn users_page(
    state: AppState,
    page: Option<u64>,
) -> Result<Json<Paginated<UserProfile>>, ApiError> {
    let pager = Pager::new(page);
    let total = state.db.count_users()?;
    let items = state
        .db
        .list_users(pager.limit, pager.offset)?
        .into_iter()
        .map(user_profile)
        .collect();

    Ok(Json(paginate(total, &pager, items)))
}
