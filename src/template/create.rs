//! Recurring template creation endpoint.

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    extract::JsonBody,
    template::{NewTemplate, RecurringTemplate, TemplateState, create_template},
};

/// Create a recurring template for the authenticated user.
///
/// The template does not generate any transactions until the month is reconciled.
pub async fn create_template_endpoint(
    State(state): State<TemplateState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(new_template): JsonBody<NewTemplate>,
) -> Result<(StatusCode, Json<RecurringTemplate>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let template = create_template(&user_id, new_template, &connection)?;

    tracing::info!("user {user_id} created recurring template {}", template.id);

    Ok((StatusCode::CREATED, Json(template)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        Cents, UserId, db::initialize, extract::JsonBody, template::TemplateAmount,
        template::TemplateState, test_utils::parse_json_body,
    };

    use super::create_template_endpoint;

    fn get_state() -> TemplateState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        TemplateState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn creates_template() {
        let new_template = serde_json::from_value(json!({
            "type": "income",
            "description": "Salary",
            "amount": "3200.50",
            "dayOfMonth": 25,
            "startDate": "2024-01-01"
        }))
        .unwrap();

        let (status, template) = create_template_endpoint(
            State(get_state()),
            Extension(UserId::new("alice")),
            JsonBody(new_template),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(template.amount, TemplateAmount::Fixed(Cents::new(320_050)));
        assert!(template.is_active);
    }

    #[tokio::test]
    async fn invalid_day_returns_422() {
        let new_template = serde_json::from_value(json!({
            "type": "expense",
            "description": "Rent",
            "dayOfMonth": 0,
            "startDate": "2024-01-01"
        }))
        .unwrap();

        let response = create_template_endpoint(
            State(get_state()),
            Extension(UserId::new("alice")),
            JsonBody(new_template),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(parse_json_body(response).await["kind"], "validation_error");
    }
}
