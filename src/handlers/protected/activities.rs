use axum::{
    extract::{Query, State},
    Extension,
};

use crate::app::AppState;
use crate::database::models::activity::POLICY;
use crate::error::ApiError;
use crate::handlers::{list_request, scope_to};
use crate::middleware::{advanced_results, AuthUser, ListEnvelope, Populate};

/// GET /api/activities - own activity log; admins see everyone's with the user expanded
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = scope_to(list_request(&state, &params, &POLICY)?, &user, "user");
    let populate: Vec<Populate> = if user.is_admin() {
        vec![Populate::new("user", state.store.users.clone()).select(&["name", "email"])]
    } else {
        Vec::new()
    };

    Ok(advanced_results(state.store.activities.as_ref(), &request, &populate).await?)
}
