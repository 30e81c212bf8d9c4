//! Loan record model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Loan record row. An absent `return_date` marks the loan as open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRecord {
    pub id: i64,
    pub book_id: i64,
    pub borrower_id: i64,
    pub borrow_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl LoanRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// New loan, inserted open
#[derive(Debug, Clone)]
pub struct CreateLoan {
    pub book_id: i64,
    pub borrower_id: i64,
    pub borrow_date: NaiveDate,
}

/// Loan history filter; at least one of `book_id` / `borrower_id` is required
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanHistoryQuery {
    pub book_id: Option<i64>,
    pub borrower_id: Option<i64>,
    /// Only loans not yet returned
    pub open_only: Option<bool>,
}

impl LoanHistoryQuery {
    pub fn for_book(book_id: i64) -> Self {
        Self {
            book_id: Some(book_id),
            ..Self::default()
        }
    }

    pub fn for_borrower(borrower_id: i64) -> Self {
        Self {
            borrower_id: Some(borrower_id),
            ..Self::default()
        }
    }
}
