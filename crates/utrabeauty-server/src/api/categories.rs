use axum::{extract::State, Extension, Json};
use utrabeauty_core::{category_tree, CategoryNode};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

/// `GET /api/categories`: the navigation tree built from the catalog file.
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<CategoryNode>>> {
    Json(ApiResponse::new(category_tree(&state.categories), req_id.0))
}
