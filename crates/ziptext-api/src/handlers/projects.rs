//! Project upload, history, download and deletion handlers.

use crate::auth::UserContext;
use crate::constants::UPLOAD_FIELD;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;
use ziptext_core::models::{ProjectTextResponse, UploadRecordResponse};
use ziptext_core::AppError;
use ziptext_storage::ByteStream;

/// Pull the archive out of the form. Other fields are ignored.
async fn extract_archive(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    let mut archive: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if archive.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Send exactly one field named '{}'",
                UPLOAD_FIELD
            )));
        }
        let filename = field.file_name().map(str::to_string).unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;
        archive = Some((filename, data));
    }

    archive.ok_or_else(|| AppError::InvalidInput("Please choose a ZIP file".to_string()))
}

/// `Content-Disposition` value with characters unsafe in a quoted header replaced.
fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

fn file_response(
    stream: ByteStream,
    content_type: &str,
    filename: &str,
) -> Result<Response<Body>, AppError> {
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, attachment_disposition(filename))
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/v0/projects",
    tag = "projects",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form with one `zip_file` field"),
    responses(
        (status = 201, description = "Archive stored and flattened", body = UploadRecordResponse),
        (status = 400, description = "Missing, empty or non-.zip file", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 413, description = "Archive too large", body = ErrorResponse),
        (status = 422, description = "File is not a readable ZIP archive", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_project(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (filename, data) = extract_archive(multipart).await?;
    let record = state.projects.upload(user.user_id, &filename, data).await?;
    Ok((StatusCode::CREATED, Json(UploadRecordResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/api/v0/projects",
    tag = "projects",
    responses(
        (status = 200, description = "Active projects, newest first", body = Vec<UploadRecordResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    user: UserContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let records = state.projects.history(user.user_id).await?;
    let response: Vec<UploadRecordResponse> =
        records.into_iter().map(UploadRecordResponse::from).collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v0/projects/{id}/text",
    tag = "projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Rendered project text", body = ProjectTextResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Project or text file not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id, project_id = %id))]
pub async fn view_project_text(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (record, content) = state.projects.read_text(id, user.user_id).await?;
    Ok(Json(ProjectTextResponse {
        project: record.into(),
        content,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/projects/{id}/text/file",
    tag = "projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Rendered text as an attachment", content_type = "text/plain"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Project or text file not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id, project_id = %id))]
pub async fn download_project_text(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (record, stream) = state.projects.text_stream(id, user.user_id).await?;
    Ok(file_response(
        stream,
        "text/plain; charset=utf-8",
        &record.text_filename(),
    )?)
}

#[utoipa::path(
    get,
    path = "/api/v0/projects/{id}/archive",
    tag = "projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Original archive as an attachment", content_type = "application/zip"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Project or archive not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id, project_id = %id))]
pub async fn download_project_archive(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (record, stream) = state.projects.archive_stream(id, user.user_id).await?;
    Ok(file_response(
        stream,
        "application/zip",
        &record.original_filename,
    )?)
}

#[utoipa::path(
    delete,
    path = "/api/v0/projects/{id}",
    tag = "projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project removed from history"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id, project_id = %id))]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.projects.soft_delete(id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
