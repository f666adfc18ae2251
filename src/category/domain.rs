//! Core category domain types.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, TransactionType, database_id::CategoryId};

/// The maximum number of graphemes in a category name.
pub const MAX_NAME_LENGTH: usize = 100;
/// The maximum number of graphemes in a category icon.
pub const MAX_ICON_LENGTH: usize = 10;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an:
    /// - [Error::EmptyCategoryName] if `name` is empty or only whitespace,
    /// - or [Error::CategoryNameTooLong] if `name` is longer than [MAX_NAME_LENGTH] graphemes.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.graphemes(true).count() > MAX_NAME_LENGTH {
            Err(Error::CategoryNameTooLong(MAX_NAME_LENGTH))
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl TryFrom<String> for CategoryName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CategoryName::new(&value)
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A display color in the form `#RRGGBB`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String")]
pub struct Color(String);

impl Color {
    /// Create a color from a `#RRGGBB` hex string.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidColor] if `color` is not a `#` followed by six hex digits.
    pub fn new(color: &str) -> Result<Self, Error> {
        let is_valid = color.len() == 7
            && color.starts_with('#')
            && color[1..].bytes().all(|b| b.is_ascii_hexdigit());

        if is_valid {
            Ok(Self(color.to_owned()))
        } else {
            Err(Error::InvalidColor(color.to_owned()))
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::new(&value)
    }
}

impl AsRef<str> for Color {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A short icon, usually a single emoji.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String")]
pub struct Icon(String);

impl Icon {
    /// Create an icon.
    ///
    /// # Errors
    ///
    /// Returns an [Error::IconTooLong] if `icon` is longer than [MAX_ICON_LENGTH] graphemes.
    pub fn new(icon: &str) -> Result<Self, Error> {
        if icon.graphemes(true).count() > MAX_ICON_LENGTH {
            Err(Error::IconTooLong(MAX_ICON_LENGTH))
        } else {
            Ok(Self(icon.to_owned()))
        }
    }
}

impl TryFrom<String> for Icon {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Icon::new(&value)
    }
}

impl AsRef<str> for Icon {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_text_sql {
    ($($name:ident),*) => {$(
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                // Values in the database were validated when they were written.
                String::column_result(value).map(Self)
            }
        }
    )*};
}

impl_text_sql!(CategoryName, Color, Icon);

/// A user defined label for grouping income or expenses (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name.
    pub name: CategoryName,
    /// Whether the category groups income or expenses. Fixed at creation.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// Optional display color.
    pub color: Option<Color>,
    /// Optional display icon.
    pub icon: Option<Icon>,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data needed to create a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Whether the category groups income or expenses.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// Optional display color.
    #[serde(default)]
    pub color: Option<Color>,
    /// Optional display icon.
    #[serde(default)]
    pub icon: Option<Icon>,
}

impl NewCategory {
    /// Start building a category with the required fields.
    pub fn new(name: CategoryName, category_type: TransactionType) -> Self {
        Self {
            name,
            category_type,
            color: None,
            icon: None,
        }
    }

    /// Set the display color.
    pub fn color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    /// Set the display icon.
    pub fn icon(mut self, icon: Option<Icon>) -> Self {
        self.icon = icon;
        self
    }
}

/// A partial update to a category.
///
/// The category type is immutable, changing it would silently flip the sign
/// of every transaction already filed under it in reports.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryUpdate {
    /// A new display name.
    #[serde(default)]
    pub name: Option<CategoryName>,
    /// A new display color.
    #[serde(default)]
    pub color: Option<Color>,
    /// A new display icon.
    #[serde(default)]
    pub icon: Option<Icon>,
}
