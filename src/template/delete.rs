//! Endpoint for retiring recurring templates.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::TemplateId,
    template::{RecurringTemplate, TemplateState, deactivate_template},
};

/// Deactivate a recurring template.
///
/// Templates are deactivated rather than deleted so that the transactions they
/// generated keep their link to the template. Responds with the deactivated template.
pub async fn deactivate_template_endpoint(
    State(state): State<TemplateState>,
    Extension(user_id): Extension<UserId>,
    Path(template_id): Path<TemplateId>,
) -> Result<Json<RecurringTemplate>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let template = deactivate_template(template_id, &user_id, &connection)?;

    tracing::info!("user {user_id} deactivated recurring template {template_id}");

    Ok(Json(template))
}
