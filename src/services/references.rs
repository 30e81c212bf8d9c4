//! Referential checks run before any write that introduces a foreign id

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    repository::{
        authors::AuthorsRepository, books::BooksRepository, borrowers::BorrowersRepository,
    },
};

/// A book may only point at an existing author.
pub async fn validate_book_refs(conn: &mut SqliteConnection, author_id: i64) -> AppResult<()> {
    if !AuthorsRepository::exists(&mut *conn, author_id).await? {
        return Err(AppError::UnknownAuthor(author_id));
    }
    Ok(())
}

/// A new loan needs an active book and an existing borrower. The book is checked first.
pub async fn validate_loan_refs(
    conn: &mut SqliteConnection,
    book_id: i64,
    borrower_id: i64,
) -> AppResult<()> {
    if !BooksRepository::exists_active(&mut *conn, book_id).await? {
        return Err(AppError::UnknownBook(book_id));
    }
    if !BorrowersRepository::exists(&mut *conn, borrower_id).await? {
        return Err(AppError::UnknownBorrower(borrower_id));
    }
    Ok(())
}
