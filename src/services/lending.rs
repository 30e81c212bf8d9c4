//! Lending state machine: borrow and return

use std::{future::Future, time::Duration};

use chrono::NaiveDate;
use rand::Rng;

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::loan::{CreateLoan, LoanRecord},
    repository::{books::BooksRepository, loans::LoansRepository, Repository},
};

use super::{locks::BookLocks, references};

/// Attempts for a transaction that keeps hitting a locked database
const MAX_ATTEMPTS: u32 = 8;
const RETRY_BACKOFF_MS: u64 = 25;

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    locks: BookLocks,
}

impl LendingService {
    pub fn new(repository: Repository, locks: BookLocks) -> Self {
        Self { repository, locks }
    }

    /// Borrow an available book.
    ///
    /// Inserts an open loan record and flips the book to borrowed in one
    /// transaction. Fails with `UnknownBook` / `UnknownBorrower` when a
    /// reference is missing and with `AlreadyBorrowed` when the book is on loan.
    pub async fn borrow_book(
        &self,
        book_id: i64,
        borrower_id: i64,
        date: NaiveDate,
    ) -> AppResult<LoanRecord> {
        let _guard = self.locks.lock(book_id).await;

        match retry_on_busy(move || self.try_borrow(book_id, borrower_id, date)).await {
            Ok(loan) => {
                tracing::info!(
                    "Book {} borrowed by {} on {} (loan {})",
                    book_id, borrower_id, date, loan.id
                );
                Ok(loan)
            }
            Err(e) => {
                tracing::warn!("Borrow of book {} by {} rejected: {}", book_id, borrower_id, e);
                Err(e)
            }
        }
    }

    /// Return a borrowed book, closing its open loan record.
    pub async fn return_book(&self, book_id: i64, date: NaiveDate) -> AppResult<LoanRecord> {
        let _guard = self.locks.lock(book_id).await;

        match retry_on_busy(move || self.try_return(book_id, date)).await {
            Ok(loan) => {
                tracing::info!("Book {} returned on {} (loan {})", book_id, date, loan.id);
                Ok(loan)
            }
            Err(e) => {
                tracing::warn!("Return of book {} rejected: {}", book_id, e);
                Err(e)
            }
        }
    }

    async fn try_borrow(
        &self,
        book_id: i64,
        borrower_id: i64,
        date: NaiveDate,
    ) -> AppResult<LoanRecord> {
        // Dropping `tx` without commit rolls both writes back
        let mut tx = self.repository.begin_write().await?;

        references::validate_loan_refs(&mut tx, book_id, borrower_id).await?;

        if !BooksRepository::mark_borrowed(&mut *tx, book_id).await? {
            return Err(AppError::AlreadyBorrowed(book_id));
        }

        let loan = LoansRepository::create(
            &mut *tx,
            &CreateLoan {
                book_id,
                borrower_id,
                borrow_date: date,
            },
        )
        .await
        .map_err(|e| match e {
            AppError::Storage(ref db) if is_unique_violation(db) => AppError::AlreadyBorrowed(book_id),
            other => other,
        })?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn try_return(&self, book_id: i64, date: NaiveDate) -> AppResult<LoanRecord> {
        let mut tx = self.repository.begin_write().await?;

        if BooksRepository::fetch(&mut *tx, book_id).await?.is_none() {
            return Err(AppError::UnknownBook(book_id));
        }

        let open = LoansRepository::find_open_for_book(&mut *tx, book_id)
            .await?
            .ok_or(AppError::NotCurrentlyBorrowed(book_id))?;

        if date < open.borrow_date {
            return Err(AppError::Validation(format!(
                "Return date {} is before borrow date {}",
                date, open.borrow_date
            )));
        }

        let closed = LoansRepository::close(&mut *tx, open.id, date)
            .await?
            .ok_or(AppError::NotCurrentlyBorrowed(book_id))?;

        if !BooksRepository::mark_returned(&mut *tx, book_id).await? {
            // Closing the loan brings the stored flag back in line
            tracing::warn!("Book {} had an open loan but was flagged available", book_id);
        }

        tx.commit().await?;
        Ok(closed)
    }
}

/// True for SQLITE_BUSY and its extended codes
pub(crate) fn is_busy(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => {
            let busy_code = db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff == 5)
                .unwrap_or(false);
            busy_code || db_err.message().contains("database is locked")
        }
        _ => false,
    }
}

/// Linear backoff plus up to one step of jitter
fn retry_delay(tries: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=RETRY_BACKOFF_MS);
    Duration::from_millis(RETRY_BACKOFF_MS * u64::from(tries) + jitter)
}

/// Re-run a whole transaction while the database reports lock contention
pub(crate) async fn retry_on_busy<T, F, Fut>(mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(AppError::Storage(ref e)) if is_busy(e) && tries < MAX_ATTEMPTS => {
                tracing::debug!("Database busy, retrying transaction (attempt {})", tries);
                tokio::time::sleep(retry_delay(tries)).await;
                tries += 1;
            }
            result => return result,
        }
    }
}
