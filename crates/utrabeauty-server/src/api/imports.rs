//! Scrape-and-import handlers.
//!
//! Both verbs run the same pipeline; `GET` takes `?url=&category=&dry_run=`,
//! `POST` takes the same fields as a JSON body.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use utrabeauty_cms::{ImportError, ImportReport};
use utrabeauty_scraper::validate_listing_url;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_query_rejection, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct ImportRequest {
    pub url: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

pub(super) async fn scrape_and_import_query(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ImportRequest>, QueryRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ImportReport>>), ApiError> {
    let Query(request) = query.map_err(|e| map_query_rejection(req_id.0.clone(), &e))?;
    run_import(&state, req_id, request).await
}

pub(super) async fn scrape_and_import(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ImportReport>>), ApiError> {
    let Json(request) = body.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    run_import(&state, req_id, request).await
}

async fn run_import(
    state: &AppState,
    req_id: RequestId,
    request: ImportRequest,
) -> Result<(StatusCode, Json<ApiResponse<ImportReport>>), ApiError> {
    let url = request
        .url
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "bad_request", "url is required"))?;
    validate_listing_url(&url)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;
    let category = request
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    tracing::info!(url = %url, category = ?category, dry_run = request.dry_run, "scrape-and-import requested");

    let result = if request.dry_run {
        state.importer.dry_run(&url, category).await
    } else {
        state.importer.import(&url, category).await
    };

    match result {
        Ok(report) => {
            let status = if report.dry_run {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            Ok((status, Json(ApiResponse::new(report, req_id.0))))
        }
        Err(e) => Err(map_import_error(req_id.0, &url, &e)),
    }
}

fn map_import_error(request_id: String, url: &str, error: &ImportError) -> ApiError {
    if error.is_client_error() {
        tracing::warn!(url = %url, error = %error, "scrape-and-import rejected");
        return ApiError::new(request_id, "validation_error", error.to_string());
    }

    match error.orphaned_document_id() {
        Some(document_id) => tracing::error!(
            url = %url,
            document_id = %document_id,
            error = %error,
            "scrape-and-import left a product without images"
        ),
        None => tracing::error!(url = %url, error = %error, "scrape-and-import failed"),
    }
    ApiError::new(request_id, "upstream_error", error.to_string())
}
