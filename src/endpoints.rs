//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/categories/{category_id}', use [format_endpoint].

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list and create recurring templates.
pub const TEMPLATES: &str = "/api/templates";
/// The route to access a single recurring template.
pub const TEMPLATE: &str = "/api/templates/{template_id}";
/// The route to generate a template's transaction for a month with a given amount.
pub const TEMPLATE_TRANSACTIONS: &str = "/api/templates/{template_id}/transactions";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list and create incomes.
pub const INCOMES: &str = "/api/incomes";
/// The route to delete an income.
pub const INCOME: &str = "/api/incomes/{income_id}";
/// The route to reconcile a month.
pub const RECONCILE: &str = "/api/reconcile";
/// The route to get the totals of a month.
pub const SUMMARY: &str = "/api/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/templates/{template_id}', '{template_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
