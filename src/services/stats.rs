//! Catalog counters and the borrowed-flag audit

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    repository::{
        authors::AuthorsRepository, books::BooksRepository, borrowers::BorrowersRepository,
        loans::LoansRepository, Repository,
    },
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryStats {
    pub authors: i64,
    pub books: i64,
    pub borrowed_books: i64,
    pub available_books: i64,
    pub borrowers: i64,
    pub loans_total: i64,
    pub loans_open: i64,
    /// Books whose borrowed flag disagrees with their open loans; empty when consistent
    pub status_mismatches: Vec<i64>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Database round-trip for readiness probes
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    /// Counters and audit read from one snapshot
    pub async fn get_stats(&self) -> AppResult<LibraryStats> {
        let mut tx = self.repository.pool.begin().await?;

        let authors = AuthorsRepository::count(&mut *tx).await?;
        let (books, borrowed_books) = BooksRepository::count(&mut *tx).await?;
        let borrowers = BorrowersRepository::count(&mut *tx).await?;
        let (loans_total, loans_open) = LoansRepository::count(&mut *tx).await?;
        let status_mismatches = BooksRepository::status_mismatches(&mut *tx).await?;

        tx.commit().await?;

        if !status_mismatches.is_empty() {
            tracing::error!("Borrowed flag out of sync for books {:?}", status_mismatches);
        }

        Ok(LibraryStats {
            authors,
            books,
            borrowed_books,
            available_books: books - borrowed_books,
            borrowers,
            loans_total,
            loans_open,
            status_mismatches,
        })
    }
}
