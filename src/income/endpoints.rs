//! HTTP endpoints for incomes.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::IncomeId,
    extract::JsonBody,
    income::{Income, IncomeState, NewIncome, create_income, delete_income, get_incomes},
};

/// The response body for the income list.
#[derive(Debug, Serialize)]
pub struct IncomeList {
    incomes: Vec<Income>,
}

/// List the authenticated user's incomes.
pub async fn list_incomes_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<IncomeList>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let incomes = get_incomes(&user_id, &connection)?;

    Ok(Json(IncomeList { incomes }))
}

/// Record an income for the authenticated user.
pub async fn create_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(new_income): JsonBody<NewIncome>,
) -> Result<(StatusCode, Json<Income>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let income = create_income(&user_id, new_income, &connection)?;

    Ok((StatusCode::CREATED, Json(income)))
}

/// Delete one of the authenticated user's incomes.
pub async fn delete_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserId>,
    Path(income_id): Path<IncomeId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_income(income_id, &user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Cents, Error, UserId,
        db::initialize,
        extract::JsonBody,
        income::{IncomeState, NewIncome},
    };

    use super::{create_income_endpoint, delete_income_endpoint, list_incomes_endpoint};

    #[tokio::test]
    async fn create_list_and_delete() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let state = IncomeState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let user = UserId::new("alice");

        let (status, income) = create_income_endpoint(
            State(state.clone()),
            Extension(user.clone()),
            JsonBody(NewIncome {
                description: "Salary".to_owned(),
                amount: Cents::new(250_000),
                date: date!(2024 - 03 - 25),
                is_recurring: true,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let list = list_incomes_endpoint(State(state.clone()), Extension(user.clone()))
            .await
            .unwrap();
        assert_eq!(list.0.incomes, vec![income.0.clone()]);

        let deleted = delete_income_endpoint(
            State(state.clone()),
            Extension(user.clone()),
            Path(income.0.id),
        )
        .await;
        assert_eq!(deleted, Ok(StatusCode::NO_CONTENT));

        let missing =
            delete_income_endpoint(State(state), Extension(user), Path(income.0.id)).await;
        assert_eq!(missing, Err(Error::NotFound));
    }
}
