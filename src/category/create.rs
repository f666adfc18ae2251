//! Category creation endpoint.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    category::{Category, CategoryState, NewCategory, create_category},
    extract::JsonBody,
};

/// Create a category for the authenticated user.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(new_category): JsonBody<NewCategory>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(&user_id, new_category, &connection)?;

    tracing::info!("user {user_id} created category {}", category.id);

    Ok((StatusCode::CREATED, Json(category)))
}
