//! Route handlers

use super::error::AppError;
use super::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use nexlify::filename::with_extension;
use nexlify::{
    archive_filename, build_archive, validate_filename, ArtifactInfo, BatchReport,
    ConversionRequest, Error,
};
use schemars::schema_for;
use serde_json::{json, Value};

/// POST /api/crawl - convert a batch of URLs
pub async fn crawl(
    State(state): State<AppState>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError> {
    let Json(request) = payload?;
    let report = state.orchestrator.run(&request).await?;
    Ok(Json(report))
}

/// GET /api/download/:filename - one stored file, `.md` optional
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let filename = checked_name(&filename)?;
    let content = state.store.get(&filename).await?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/markdown; charset=utf-8".to_string(),
            ),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        content,
    )
        .into_response())
}

/// GET /api/download/bulk - every stored file as a ZIP
pub async fn download_all(State(state): State<AppState>) -> Result<Response, AppError> {
    let bytes = build_archive(&state.store, None).await?;
    Ok(zip_response(bytes))
}

/// POST /api/download/bulk - the named files as a ZIP
pub async fn download_selected(
    State(state): State<AppState>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(names) = payload?;
    let names = names
        .iter()
        .map(|name| checked_name(name))
        .collect::<Result<Vec<_>, _>>()?;

    let bytes = build_archive(&state.store, Some(&names)).await?;
    Ok(zip_response(bytes))
}

/// GET /api/files - stored file metadata
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<ArtifactInfo>>, AppError> {
    Ok(Json(state.store.list_artifacts().await?))
}

/// GET /api/schema - JSON Schemas of the request and report bodies
pub async fn schema() -> Json<Value> {
    Json(json!({
        "request": schema_for!(ConversionRequest),
        "report": schema_for!(BatchReport),
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn checked_name(raw: &str) -> Result<String, AppError> {
    let name = with_extension(raw.trim());
    validate_filename(&name).map_err(Error::Validation)?;
    Ok(name)
}

fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}

fn zip_response(bytes: Bytes) -> Response {
    let filename = archive_filename(Utc::now());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        bytes,
    )
        .into_response()
}
