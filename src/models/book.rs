//! Book (catalog copy) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Lending status of a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl From<bool> for BookStatus {
    fn from(is_borrowed: bool) -> Self {
        if is_borrowed {
            BookStatus::Borrowed
        } else {
            BookStatus::Available
        }
    }
}

/// Book row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub genre: String,
    pub is_borrowed: bool,
    /// Set when a book with loan history was removed from the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn status(&self) -> BookStatus {
        BookStatus::from(self.is_borrowed)
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub author_id: i64,
    #[serde(default)]
    pub genre: String,
}

/// Partial book update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub genre: Option<String>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author_id.is_none() && self.genre.is_none()
    }
}

/// Book listing filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Only books not currently on loan
    pub available_only: Option<bool>,
    pub author_id: Option<i64>,
    pub genre: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
