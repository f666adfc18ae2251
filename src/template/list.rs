//! Endpoints for reading recurring templates.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::TemplateId,
    template::{RecurringTemplate, TemplateState, get_template, get_templates},
};

/// The response body for the template list.
#[derive(Debug, Serialize)]
pub struct TemplateList {
    templates: Vec<RecurringTemplate>,
}

/// List all of the authenticated user's templates, including inactive ones.
pub async fn list_templates_endpoint(
    State(state): State<TemplateState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<TemplateList>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let templates = get_templates(&user_id, &connection)?;

    Ok(Json(TemplateList { templates }))
}

/// Get a single template owned by the authenticated user.
pub async fn get_template_endpoint(
    State(state): State<TemplateState>,
    Extension(user_id): Extension<UserId>,
    Path(template_id): Path<TemplateId>,
) -> Result<Json<RecurringTemplate>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_template(template_id, &user_id, &connection).map(Json)
}
