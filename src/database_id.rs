//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// Database identifier for a category.
pub type CategoryId = DatabaseId;
/// Database identifier for a recurring template.
pub type TemplateId = DatabaseId;
/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;
/// Database identifier for an income record.
pub type IncomeId = DatabaseId;
