//! Read-only catalog queries

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookQuery},
        borrower::Borrower,
        loan::{LoanHistoryQuery, LoanRecord},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List catalog books with filters, returning the page and the total count
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn list_borrowers(&self) -> AppResult<Vec<Borrower>> {
        self.repository.borrowers.list().await
    }

    pub async fn get_borrower(&self, id: i64) -> AppResult<Borrower> {
        self.repository.borrowers.get_by_id(id).await
    }

    /// Loan history of a book and/or a borrower, oldest first
    pub async fn list_loan_history(&self, query: &LoanHistoryQuery) -> AppResult<Vec<LoanRecord>> {
        if query.book_id.is_none() && query.borrower_id.is_none() {
            return Err(AppError::Validation(
                "book_id or borrower_id required".to_string(),
            ));
        }
        self.repository.loans.history(query).await
    }

    pub async fn get_loan(&self, id: i64) -> AppResult<LoanRecord> {
        self.repository.loans.get_by_id(id).await
    }
}
