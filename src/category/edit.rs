//! Category update endpoint.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    category::{Category, CategoryState, CategoryUpdate, update_category},
    database_id::CategoryId,
    extract::JsonBody,
};

/// Update the name, color or icon of a category.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
    JsonBody(update): JsonBody<CategoryUpdate>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_category(category_id, &user_id, update, &connection).map(Json)
}
