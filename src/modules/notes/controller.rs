use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::modules::auth::{extractor::VerifiedUser, schema::ErrorResponse};
use crate::modules::notes::{
    crud::{NoteCrud, NoteError, NoteFilters},
    schema::{
        CreateNoteRequest, DeleteResponse, ListQuery, ListResponse, NoteEnvelope, NoteResponse,
        UpdateNoteRequest,
    },
};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 50;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_response(e: NoteError) -> ErrorReply {
    let status = e.status_code();
    let body = match e {
        NoteError::Validation(details) => ErrorResponse::with_details("Validation failed", details),
        NoteError::Database(err) => {
            tracing::error!(error = %err, "notes database error");
            ErrorResponse::new("Internal server error")
        }
        other => ErrorResponse::new(other.to_string()),
    };
    (status, Json(body))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn list(
    VerifiedUser(_user): VerifiedUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ErrorReply> {
    let crud = NoteCrud::new(state.db.clone());

    // Blank or whitespace-only filter values behave as if absent.
    let filters = NoteFilters {
        search: non_blank(query.search),
        status: non_blank(query.status),
        category: non_blank(query.category),
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(0);
    let offset = query.offset.unwrap_or(0).max(0);

    let notes = crud
        .list(&filters, limit, offset)
        .await
        .map_err(error_response)?;
    let categories = crud.categories().await.map_err(error_response)?;

    Ok(Json(ListResponse {
        notes: notes.into_iter().map(NoteResponse::from).collect(),
        categories,
    }))
}

pub async fn show(
    VerifiedUser(_user): VerifiedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<NoteEnvelope>, ErrorReply> {
    let note = NoteCrud::new(state.db.clone())
        .get(id)
        .await
        .map_err(error_response)?;

    Ok(Json(NoteEnvelope { note: note.into() }))
}

pub async fn create(
    VerifiedUser(user): VerifiedUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteEnvelope>), ErrorReply> {
    // Ownership comes from the authenticated caller, never from the payload.
    let note = NoteCrud::new(state.db.clone())
        .create(&user.id, &req)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(NoteEnvelope { note: note.into() })))
}

pub async fn update(
    VerifiedUser(user): VerifiedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<NoteEnvelope>, ErrorReply> {
    let note = NoteCrud::new(state.db.clone())
        .update(id, &user.id, &req)
        .await
        .map_err(error_response)?;

    Ok(Json(NoteEnvelope { note: note.into() }))
}

pub async fn destroy(
    VerifiedUser(user): VerifiedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ErrorReply> {
    NoteCrud::new(state.db.clone())
        .delete(id, &user.id)
        .await
        .map_err(error_response)?;

    Ok(Json(DeleteResponse {
        message: "Note deleted successfully",
    }))
}
