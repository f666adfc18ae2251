//! Category deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    category::{CategoryState, delete_category},
    database_id::CategoryId,
};

/// Delete a category that is not referenced by any transaction or recurring template.
///
/// Responds with 204 on success, 404 if the category is not the user's, and
/// 409 if the category is still in use.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_category(category_id, &user_id, &connection) {
        Ok(_) => {
            tracing::info!("user {user_id} deleted category {category_id}");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(error @ Error::CategoryInUse { .. }) => {
            tracing::info!("refused to delete category {category_id}: {error}");
            Err(error)
        }
        Err(error) => Err(error),
    }
}
