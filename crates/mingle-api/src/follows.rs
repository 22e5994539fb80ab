use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use mingle_db::models::{FollowDetailRow, FollowWithPeerRow};
use mingle_types::api::{Claims, FollowDetail, FollowRequest, FollowWithPeer, FollowsPage};
use mingle_types::models::FollowEdge;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::pagination::{Pager, page_count};
use crate::relations::resolve_relations;
use crate::{profile_summary, uuid_or_nil};

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FollowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let followed = req
        .followed
        .ok_or_else(|| ApiError::Validation("send the user id to follow".into()))?;

    if followed == claims.sub {
        return Err(ApiError::Validation("you cannot follow yourself".into()));
    }

    state
        .db
        .get_user_by_id(&followed.to_string())?
        .ok_or(ApiError::NotFound("user"))?;

    let id = Uuid::new_v4();
    let inserted = state.db.insert_follow(
        &id.to_string(),
        &claims.sub.to_string(),
        &followed.to_string(),
    )?;

    if !inserted {
        return Err(ApiError::Conflict("you already follow that user".into()));
    }

    info!("{} now follows {}", claims.sub, followed);

    Ok((
        StatusCode::CREATED,
        Json(FollowEdge {
            id,
            follower: claims.sub,
            followed,
        }),
    ))
}

/// Unfollow is idempotent: deleting an edge that never existed still acks.
pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state
        .db
        .delete_follow(&claims.sub.to_string(), &id.to_string())?;

    Ok(Json(json!({
        "message": "follow removed",
        "deleted": removed,
    })))
}

// -- Paginated listings --
//
// The optional {id} defaults to the caller; the decoration sets reflect the
// configured decoration subject (see RelationDecoration).

pub async fn following(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FollowsPage>, ApiError> {
    following_page(state, claims, None, None).await
}

pub async fn following_of(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowsPage>, ApiError> {
    following_page(state, claims, Some(id), None).await
}

pub async fn following_of_page(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, page)): Path<(Uuid, u64)>,
) -> Result<Json<FollowsPage>, ApiError> {
    following_page(state, claims, Some(id), Some(page)).await
}

pub async fn followers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FollowsPage>, ApiError> {
    followers_page(state, claims, None, None).await
}

pub async fn followers_of(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowsPage>, ApiError> {
    followers_page(state, claims, Some(id), None).await
}

pub async fn followers_of_page(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, page)): Path<(Uuid, u64)>,
) -> Result<Json<FollowsPage>, ApiError> {
    followers_page(state, claims, Some(id), Some(page)).await
}

async fn following_page(
    state: AppState,
    claims: Claims,
    subject: Option<Uuid>,
    page: Option<u64>,
) -> Result<Json<FollowsPage>, ApiError> {
    let subject = subject.unwrap_or(claims.sub);
    let pager = Pager::new(page);

    let total = state.db.count_following(&subject.to_string())?;
    let rows = state
        .db
        .list_following(&subject.to_string(), pager.limit, pager.offset)?;

    decorate_page(state, claims, subject, pager, total, rows)
}

async fn followers_page(
    state: AppState,
    claims: Claims,
    subject: Option<Uuid>,
    page: Option<u64>,
) -> Result<Json<FollowsPage>, ApiError> {
    let subject = subject.unwrap_or(claims.sub);
    let pager = Pager::new(page);

    let total = state.db.count_followers(&subject.to_string())?;
    let rows = state
        .db
        .list_followers(&subject.to_string(), pager.limit, pager.offset)?;

    decorate_page(state, claims, subject, pager, total, rows)
}

fn decorate_page(
    state: AppState,
    claims: Claims,
    subject: Uuid,
    pager: Pager,
    total: u64,
    rows: Vec<FollowWithPeerRow>,
) -> Result<Json<FollowsPage>, ApiError> {
    let decoration_subject = state.decoration.subject_for(claims.sub, subject);
    let relations = resolve_relations(&state.db, &decoration_subject)?;

    Ok(Json(FollowsPage {
        total,
        pages: page_count(total),
        page: pager.page,
        follows: rows.into_iter().map(follow_with_peer).collect(),
        users_following: relations.following.into_iter().collect(),
        users_follow_me: relations.followed.into_iter().collect(),
    }))
}

// -- Unpaginated dump of the caller's own edges --

pub async fn my_follows(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    my_follows_list(state, claims, false)
}

/// The path flag flips the direction: edges where the caller is followed.
pub async fn my_follows_reverse(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(_followed): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    my_follows_list(state, claims, true)
}

fn my_follows_list(
    state: AppState,
    claims: Claims,
    reverse: bool,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rows = state
        .db
        .list_follow_details(&claims.sub.to_string(), reverse)?;
    let follows: Vec<FollowDetail> = rows.into_iter().map(follow_detail).collect();

    Ok(Json(json!({ "follows": follows })))
}

// -- Row mapping --

fn follow_with_peer(row: FollowWithPeerRow) -> FollowWithPeer {
    FollowWithPeer {
        follow: FollowEdge {
            id: uuid_or_nil(&row.follow.id),
            follower: uuid_or_nil(&row.follow.follower_id),
            followed: uuid_or_nil(&row.follow.followed_id),
        },
        peer: profile_summary(row.peer),
    }
}

fn follow_detail(row: FollowDetailRow) -> FollowDetail {
    FollowDetail {
        follow: FollowEdge {
            id: uuid_or_nil(&row.follow.id),
            follower: uuid_or_nil(&row.follow.follower_id),
            followed: uuid_or_nil(&row.follow.followed_id),
        },
        follower_profile: profile_summary(row.follower),
        followed_profile: profile_summary(row.followed),
    }
}
