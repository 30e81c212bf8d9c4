//! Books repository for database operations

use sqlx::{Executor, Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

use super::FilterValue;

const BOOK_COLUMNS: &str = "id, title, author_id, genre, is_borrowed, archived_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert a new book; books always start available
    pub async fn create<'e, E>(executor: E, book: &CreateBook) -> AppResult<Book>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let created = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, author_id, genre, is_borrowed) VALUES (?, ?, ?, 0) RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.genre)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Fetch a book row, archived or not
    pub async fn fetch<'e, E>(executor: E, id: i64) -> AppResult<Option<Book>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = ?",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(book)
    }

    /// True if the book exists and has not been archived
    pub async fn exists_active<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE id = ? AND archived_at IS NULL)",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Apply a partial update to an active book
    pub async fn update<'e, E>(executor: E, id: i64, update: &UpdateBook) -> AppResult<Option<Book>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = COALESCE(?, title),
                author_id = COALESCE(?, author_id),
                genre = COALESCE(?, genre)
            WHERE id = ? AND archived_at IS NULL
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(update.title.as_deref())
        .bind(update.author_id)
        .bind(update.genre.as_deref())
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(book)
    }

    /// Available -> Borrowed. Returns false if the book was not available.
    pub async fn mark_borrowed<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE books SET is_borrowed = 1 WHERE id = ? AND is_borrowed = 0 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Borrowed -> Available. Returns false if the book was not borrowed.
    pub async fn mark_returned<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE books SET is_borrowed = 0 WHERE id = ? AND is_borrowed = 1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Hide a book from the catalog while keeping its row for loan history
    pub async fn archive<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE books SET archived_at = ?
            WHERE id = ? AND archived_at IS NULL AND is_borrowed = 0
            "#,
        )
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Returns true if a row was removed
    pub async fn delete<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM books WHERE id = ? AND is_borrowed = 0")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of books (archived included) written by an author
    pub async fn count_by_author<'e, E>(executor: E, author_id: i64) -> AppResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Get an active book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        Self::fetch(&self.pool, id)
            .await?
            .filter(|book| !book.is_archived())
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search active books with filters, returning the page and the total match count
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let mut conditions = vec!["archived_at IS NULL".to_string()];
        let mut params: Vec<FilterValue> = Vec::new();

        if query.available_only.unwrap_or(false) {
            conditions.push("is_borrowed = 0".to_string());
        }

        if let Some(author_id) = query.author_id {
            params.push(FilterValue::Int(author_id));
            conditions.push("author_id = ?".to_string());
        }

        if let Some(ref genre) = query.genre {
            params.push(FilterValue::Text(genre.clone()));
            conditions.push("LOWER(genre) = LOWER(?)".to_string());
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        // LIMIT -1 means no limit in SQLite
        let per_page = query.per_page.filter(|n| *n > 0).unwrap_or(-1);
        let page = query.page.filter(|p| *p > 0).unwrap_or(1);
        let offset = if per_page > 0 {
            (page - 1).checked_mul(per_page).ok_or_else(|| {
                AppError::Validation(format!("Page {} is out of range", page))
            })?
        } else {
            0
        };

        // Count total
        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = match param {
                FilterValue::Int(v) => count_builder.bind(*v),
                FilterValue::Text(v) => count_builder.bind(v.clone()),
            };
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM books {} ORDER BY id LIMIT {} OFFSET {}",
            BOOK_COLUMNS, where_clause, per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = match param {
                FilterValue::Int(v) => select_builder.bind(*v),
                FilterValue::Text(v) => select_builder.bind(v.clone()),
            };
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Count active books, and of those the ones on loan
    pub async fn count<'e, E>(executor: E) -> AppResult<(i64, i64)>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let (total, borrowed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(is_borrowed), 0)
            FROM books WHERE archived_at IS NULL
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok((total, borrowed))
    }

    /// Books whose stored status disagrees with their open loan count
    pub async fn status_mismatches<'e, E>(executor: E) -> AppResult<Vec<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            WITH open_loans AS (
                SELECT book_id, COUNT(*) AS n
                FROM loans
                WHERE return_date IS NULL
                GROUP BY book_id
            )
            SELECT b.id
            FROM books b
            LEFT JOIN open_loans o ON o.book_id = b.id
            WHERE (b.is_borrowed = 1 AND COALESCE(o.n, 0) != 1)
               OR (b.is_borrowed = 0 AND COALESCE(o.n, 0) != 0)
            ORDER BY b.id
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }
}
