//! Loans repository for database operations

use chrono::NaiveDate;
use sqlx::{Executor, Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, LoanHistoryQuery, LoanRecord},
};

const LOAN_COLUMNS: &str = "id, book_id, borrower_id, borrow_date, return_date";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert an open loan record
    pub async fn create<'e, E>(executor: E, loan: &CreateLoan) -> AppResult<LoanRecord>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let created = sqlx::query_as::<_, LoanRecord>(&format!(
            r#"
            INSERT INTO loans (book_id, borrower_id, borrow_date, return_date)
            VALUES (?, ?, ?, NULL)
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan.book_id)
        .bind(loan.borrower_id)
        .bind(loan.borrow_date)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn fetch<'e, E>(executor: E, id: i64) -> AppResult<Option<LoanRecord>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let loan = sqlx::query_as::<_, LoanRecord>(&format!(
            "SELECT {} FROM loans WHERE id = ?",
            LOAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(loan)
    }

    /// The open loan of a book, if any
    pub async fn find_open_for_book<'e, E>(executor: E, book_id: i64) -> AppResult<Option<LoanRecord>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let loan = sqlx::query_as::<_, LoanRecord>(&format!(
            "SELECT {} FROM loans WHERE book_id = ? AND return_date IS NULL",
            LOAN_COLUMNS
        ))
        .bind(book_id)
        .fetch_optional(executor)
        .await?;
        Ok(loan)
    }

    /// Close an open loan. Closed loans are left untouched and yield `None`.
    pub async fn close<'e, E>(
        executor: E,
        loan_id: i64,
        return_date: NaiveDate,
    ) -> AppResult<Option<LoanRecord>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let loan = sqlx::query_as::<_, LoanRecord>(&format!(
            "UPDATE loans SET return_date = ? WHERE id = ? AND return_date IS NULL RETURNING {}",
            LOAN_COLUMNS
        ))
        .bind(return_date)
        .bind(loan_id)
        .fetch_optional(executor)
        .await?;
        Ok(loan)
    }

    pub async fn count_for_book<'e, E>(executor: E, book_id: i64) -> AppResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn count_for_borrower<'e, E>(executor: E, borrower_id: i64) -> AppResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE borrower_id = ?")
            .bind(borrower_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<LoanRecord> {
        Self::fetch(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Loan history filtered by book and/or borrower, oldest first
    pub async fn history(&self, query: &LoanHistoryQuery) -> AppResult<Vec<LoanRecord>> {
        let mut conditions = Vec::new();
        let mut params: Vec<i64> = Vec::new();

        if let Some(book_id) = query.book_id {
            params.push(book_id);
            conditions.push("book_id = ?");
        }

        if let Some(borrower_id) = query.borrower_id {
            params.push(borrower_id);
            conditions.push("borrower_id = ?");
        }

        if query.open_only.unwrap_or(false) {
            conditions.push("return_date IS NULL");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!(
            "SELECT {} FROM loans {} ORDER BY borrow_date, id",
            LOAN_COLUMNS, where_clause
        );

        let mut builder = sqlx::query_as::<_, LoanRecord>(&select_query);
        for param in params {
            builder = builder.bind(param);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    /// Count (all, open) loan records
    pub async fn count<'e, E>(executor: E) -> AppResult<(i64, i64)>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let (total, open): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN return_date IS NULL THEN 1 ELSE 0 END), 0)
            FROM loans
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok((total, open))
    }
}
