//! Group directory routes.
//!
//! Read-only listing the settings UI uses to pick approver groups.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::routes::approval_rules::check_company_scope;
use crate::routes::quality_documents::internal_error;
use crate::{AppState, middleware::AuthUser};
use fabriq_db::CompanyScopeExt;
use fabriq_db::repositories::group::GroupRepository;

/// Creates the group routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/companies/{company_id}/groups", get(list_groups))
}

/// Response for a group.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    /// Group ID.
    pub id: Uuid,
    /// Group name.
    pub name: String,
}

/// GET `/companies/{company_id}/groups` - List approver candidate groups.
async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:settings") {
        return response;
    }

    let conn = match state.db.with_company(company_id).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "Failed to open company-scoped connection");
            return internal_error();
        }
    };

    let repo = GroupRepository::new(&conn);
    match repo.list_approver_groups(company_id).await {
        Ok(groups) => {
            let items: Vec<GroupResponse> = groups
                .into_iter()
                .map(|g| GroupResponse {
                    id: g.id,
                    name: g.name,
                })
                .collect();

            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list groups");
            internal_error()
        }
    }
}
