//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::auth_guard,
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    },
    endpoints,
    income::{create_income_endpoint, delete_income_endpoint, list_incomes_endpoint},
    reconcile::{materialize_endpoint, reconcile_endpoint},
    summary::get_summary_endpoint,
    template::{
        create_template_endpoint, deactivate_template_endpoint, get_template_endpoint,
        list_templates_endpoint, update_template_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .patch(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TEMPLATES,
            get(list_templates_endpoint).post(create_template_endpoint),
        )
        .route(
            endpoints::TEMPLATE,
            get(get_template_endpoint)
                .patch(update_template_endpoint)
                .delete(deactivate_template_endpoint),
        )
        .route(endpoints::TEMPLATE_TRANSACTIONS, post(materialize_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::INCOMES,
            get(list_incomes_endpoint).post(create_income_endpoint),
        )
        .route(endpoints::INCOME, delete(delete_income_endpoint))
        .route(endpoints::RECONCILE, post(reconcile_endpoint))
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
