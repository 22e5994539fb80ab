use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use mingle_db::models::PublicationWithAuthorRow;
use mingle_types::api::{Claims, CreatePublicationRequest, Paginated, PublicationWithAuthor};
use mingle_types::models::Publication;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::pagination::{Pager, paginate};
use crate::relations::visibility_scope;
use crate::storage::Storage;
use crate::{profile_summary, uuid_or_nil};

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePublicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("a publication must have text".into()));
    }

    let id = Uuid::new_v4();
    let created_at = chrono::Utc::now().timestamp();

    state
        .db
        .insert_publication(&id.to_string(), &claims.sub.to_string(), &req.text, created_at)?;

    Ok((
        StatusCode::CREATED,
        Json(Publication {
            id,
            author: claims.sub,
            text: req.text,
            file: None,
            created_at,
        }),
    ))
}

// -- Feed: publications from everyone in the caller's visibility scope --

pub async fn feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Paginated<PublicationWithAuthor>>, ApiError> {
    feed_page(state, claims, None).await
}

pub async fn feed_at(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(page): Path<u64>,
) -> Result<Json<Paginated<PublicationWithAuthor>>, ApiError> {
    feed_page(state, claims, Some(page)).await
}

async fn feed_page(
    state: AppState,
    claims: Claims,
    page: Option<u64>,
) -> Result<Json<Paginated<PublicationWithAuthor>>, ApiError> {
    let scope: Vec<String> = visibility_scope(&state.db, &claims.sub)?
        .iter()
        .map(Uuid::to_string)
        .collect();

    let pager = Pager::new(page);
    let total = state.db.count_publications_by_authors(&scope)?;
    let rows = state
        .db
        .publications_by_authors(&scope, pager.limit, pager.offset)?;

    Ok(Json(paginate(
        total,
        &pager,
        rows.into_iter().map(publication_with_author).collect(),
    )))
}

// -- One author's publications, visible to any authenticated caller --

pub async fn by_author(
    State(state): State<AppState>,
    Path(user): Path<Uuid>,
) -> Result<Json<Paginated<PublicationWithAuthor>>, ApiError> {
    author_page(state, user, None).await
}

pub async fn by_author_at(
    State(state): State<AppState>,
    Path((user, page)): Path<(Uuid, u64)>,
) -> Result<Json<Paginated<PublicationWithAuthor>>, ApiError> {
    author_page(state, user, Some(page)).await
}

async fn author_page(
    state: AppState,
    author: Uuid,
    page: Option<u64>,
) -> Result<Json<Paginated<PublicationWithAuthor>>, ApiError> {
    let pager = Pager::new(page);
    let total = state.db.count_publications_by_author(&author.to_string())?;
    let rows = state
        .db
        .publications_by_author(&author.to_string(), pager.limit, pager.offset)?;

    Ok(Json(paginate(
        total,
        &pager,
        rows.into_iter().map(publication_with_author).collect(),
    )))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Publication>, ApiError> {
    let row = state
        .db
        .get_publication(&id.to_string())?
        .ok_or(ApiError::NotFound("publication"))?;

    Ok(Json(Publication {
        id,
        author: uuid_or_nil(&row.author_id),
        text: row.text,
        file: row.file,
        created_at: row.created_at,
    }))
}

/// Only the author can delete. A delete that matched nothing — wrong owner or
/// no such publication — is reported as not deleted.
pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state
        .db
        .delete_publication(&id.to_string(), &claims.sub.to_string())?;

    if removed == 0 {
        return Err(ApiError::Forbidden("the publication was not deleted".into()));
    }

    Ok(Json(json!({ "message": "publication deleted" })))
}

/// Attach an image to one of the caller's publications.
///
/// The upload is written to disk before any check runs, so every rejection
/// below must also remove the file it just stored.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Publication>, ApiError> {
    let mut stored: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed upload: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let original = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Validation("the upload has no file name".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("malformed upload: {e}")))?;

        stored = Some(state.storage.save(&original, &data).await?);
        break;
    }

    let stored = stored.ok_or_else(|| ApiError::Validation("no file was uploaded".into()))?;

    if !Storage::extension_allowed(&stored) {
        state.storage.delete(&stored).await.ok();
        return Err(ApiError::Validation("invalid image extension".into()));
    }

    let row = match state.db.get_publication(&id.to_string()) {
        Ok(Some(row)) => row,
        Ok(None) => {
            state.storage.delete(&stored).await.ok();
            return Err(ApiError::NotFound("publication"));
        }
        Err(e) => {
            state.storage.delete(&stored).await.ok();
            return Err(e.into());
        }
    };

    if row.author_id != claims.sub.to_string() {
        state.storage.delete(&stored).await.ok();
        return Err(ApiError::Forbidden(
            "you cannot update another user's publication".into(),
        ));
    }

    state.db.set_publication_file(&id.to_string(), &stored)?;
    info!("attached image {} to publication {}", stored, id);

    Ok(Json(Publication {
        id,
        author: claims.sub,
        text: row.text,
        file: Some(stored),
        created_at: row.created_at,
    }))
}

/// Serve a stored image by its generated filename. Unauthenticated, like the
/// rest of the static image surface.
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_file): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .storage
        .read(&image_file)
        .await?
        .ok_or(ApiError::NotFound("image"))?;

    Ok((
        [(header::CONTENT_TYPE, Storage::content_type(&image_file))],
        bytes,
    ))
}

fn publication_with_author(row: PublicationWithAuthorRow) -> PublicationWithAuthor {
    PublicationWithAuthor {
        id: uuid_or_nil(&row.publication.id),
        text: row.publication.text,
        file: row.publication.file,
        created_at: row.publication.created_at,
        author: profile_summary(row.author),
    }
}
