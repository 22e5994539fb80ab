use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use mingle_db::models::{MessageRow, MessageWithEmitterRow, MessageWithPeersRow};
use mingle_types::api::{Claims, MessageWithEmitter, MessageWithPeers, Paginated, SendMessageRequest};
use mingle_types::models::Message;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::pagination::{Pager, paginate};
use crate::{profile_summary, uuid_or_nil};

pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receiver = req
        .receiver
        .ok_or_else(|| ApiError::Validation("send the message text and receiver".into()))?;
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("send the message text and receiver".into()));
    }

    state
        .db
        .get_user_by_id(&receiver.to_string())?
        .ok_or(ApiError::NotFound("receiver"))?;

    let id = Uuid::new_v4();
    let created_at = chrono::Utc::now().timestamp();

    state.db.insert_message(
        &id.to_string(),
        &claims.sub.to_string(),
        &receiver.to_string(),
        &req.text,
        created_at,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(Message {
            id,
            emitter: claims.sub,
            receiver,
            text: req.text,
            viewed: false,
            created_at,
        }),
    ))
}

// -- Inbox: messages addressed to the caller --

pub async fn inbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Paginated<MessageWithEmitter>>, ApiError> {
    inbox_page(state, claims, None).await
}

pub async fn inbox_at(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(page): Path<u64>,
) -> Result<Json<Paginated<MessageWithEmitter>>, ApiError> {
    inbox_page(state, claims, Some(page)).await
}

async fn inbox_page(
    state: AppState,
    claims: Claims,
    page: Option<u64>,
) -> Result<Json<Paginated<MessageWithEmitter>>, ApiError> {
    let pager = Pager::new(page);
    let total = state.db.count_inbox(&claims.sub.to_string())?;
    let rows = state
        .db
        .inbox(&claims.sub.to_string(), pager.limit, pager.offset)?;

    Ok(Json(paginate(
        total,
        &pager,
        rows.into_iter().map(with_emitter).collect(),
    )))
}

// -- Outbox: messages the caller has sent --

pub async fn outbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Paginated<MessageWithPeers>>, ApiError> {
    outbox_page(state, claims, None).await
}

pub async fn outbox_at(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(page): Path<u64>,
) -> Result<Json<Paginated<MessageWithPeers>>, ApiError> {
    outbox_page(state, claims, Some(page)).await
}

async fn outbox_page(
    state: AppState,
    claims: Claims,
    page: Option<u64>,
) -> Result<Json<Paginated<MessageWithPeers>>, ApiError> {
    let pager = Pager::new(page);
    let total = state.db.count_outbox(&claims.sub.to_string())?;
    let rows = state
        .db
        .outbox(&claims.sub.to_string(), pager.limit, pager.offset)?;

    Ok(Json(paginate(
        total,
        &pager,
        rows.into_iter().map(with_peers).collect(),
    )))
}

pub async fn unviewed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.db.count_unviewed(&claims.sub.to_string())?;
    Ok(Json(json!({ "unviewed": count })))
}

/// Marks every unread message addressed to the caller, across all senders.
pub async fn set_viewed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.db.mark_all_viewed(&claims.sub.to_string())?;
    Ok(Json(json!({ "updated": updated })))
}

// -- Row mapping --

fn message(row: MessageRow) -> Message {
    Message {
        id: uuid_or_nil(&row.id),
        emitter: uuid_or_nil(&row.emitter_id),
        receiver: uuid_or_nil(&row.receiver_id),
        text: row.text,
        viewed: row.viewed,
        created_at: row.created_at,
    }
}

fn with_emitter(row: MessageWithEmitterRow) -> MessageWithEmitter {
    MessageWithEmitter {
        message: message(row.message),
        emitter_profile: profile_summary(row.emitter),
    }
}

fn with_peers(row: MessageWithPeersRow) -> MessageWithPeers {
    MessageWithPeers {
        message: message(row.message),
        emitter_profile: profile_summary(row.emitter),
        receiver_profile: profile_summary(row.receiver),
    }
}
