//! Endpoints for reading categories.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, TransactionType, UserId,
    app_state::lock_connection,
    category::{Category, CategoryState, get_categories, get_category},
    database_id::CategoryId,
    extract::QueryParams,
};

/// Query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    /// Only return categories of this type.
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
}

/// The response body for the category list.
#[derive(Debug, Serialize)]
pub struct CategoryList {
    categories: Vec<Category>,
}

/// List the authenticated user's categories, optionally filtered by type.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<ListCategoriesQuery>,
) -> Result<Json<CategoryList>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let categories = get_categories(&user_id, query.category_type, &connection)?;

    Ok(Json(CategoryList { categories }))
}

/// Get a single category owned by the authenticated user.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category(category_id, &user_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;

    use crate::{
        Error, TransactionType, UserId,
        category::{CategoryName, CategoryState, NewCategory, create_category},
        db::initialize,
        extract::QueryParams,
    };

    use super::{ListCategoriesQuery, get_category_endpoint, list_categories_endpoint};

    fn get_state() -> CategoryState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn lists_categories_of_requested_type() {
        let state = get_state();
        let user = UserId::new("alice");
        let rent = {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                &user,
                NewCategory::new(CategoryName::new_unchecked("Salary"), TransactionType::Income),
                &connection,
            )
            .unwrap();
            create_category(
                &user,
                NewCategory::new(CategoryName::new_unchecked("Rent"), TransactionType::Expense),
                &connection,
            )
            .unwrap()
        };

        let list = list_categories_endpoint(
            State(state),
            Extension(user),
            QueryParams(ListCategoriesQuery {
                category_type: Some(TransactionType::Expense),
            }),
        )
        .await
        .unwrap();

        assert_eq!(list.0.categories, vec![rent]);
    }

    #[tokio::test]
    async fn get_category_of_other_user_is_not_found() {
        let state = get_state();
        let category = create_category(
            &UserId::new("alice"),
            NewCategory::new(CategoryName::new_unchecked("Rent"), TransactionType::Expense),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let result = get_category_endpoint(
            State(state),
            Extension(UserId::new("mallory")),
            Path(category.id),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
