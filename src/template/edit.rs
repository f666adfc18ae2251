//! Recurring template update endpoint.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::TemplateId,
    extract::JsonBody,
    template::{RecurringTemplate, TemplateState, TemplateUpdate, update_template},
};

/// Apply a partial update to a recurring template.
pub async fn update_template_endpoint(
    State(state): State<TemplateState>,
    Extension(user_id): Extension<UserId>,
    Path(template_id): Path<TemplateId>,
    JsonBody(update): JsonBody<TemplateUpdate>,
) -> Result<Json<RecurringTemplate>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_template(template_id, &user_id, update, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Cents, TransactionType, UserId,
        db::initialize,
        extract::JsonBody,
        template::{NewTemplate, TemplateAmount, TemplateState, create_template},
    };

    use super::update_template_endpoint;

    #[tokio::test]
    async fn sets_fixed_amount_on_variable_template() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = UserId::new("alice");
        let template = create_template(
            &user,
            NewTemplate::build(
                TransactionType::Expense,
                "Phone",
                TemplateAmount::Variable,
                12,
                date!(2024 - 01 - 01),
            ),
            &connection,
        )
        .unwrap();
        let state = TemplateState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let updated = update_template_endpoint(
            State(state),
            Extension(user),
            Path(template.id),
            JsonBody(serde_json::from_value(json!({ "amount": 45 })).unwrap()),
        )
        .await
        .unwrap();

        assert_eq!(updated.0.amount, TemplateAmount::Fixed(Cents::new(4500)));
    }
}
