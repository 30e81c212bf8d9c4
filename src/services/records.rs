//! Add, update and delete operations for authors, books and borrowers

use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, CreateBook, UpdateBook},
        borrower::{Borrower, CreateBorrower, UpdateBorrower},
    },
    repository::{
        authors::AuthorsRepository, books::BooksRepository, borrowers::BorrowersRepository,
        loans::LoansRepository, Repository,
    },
};

use super::{lending::retry_on_busy, locks::BookLocks, references};

/// Outcome of a book deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookRemoval {
    /// Row removed; the book had never been lent
    Deleted,
    /// Row kept and hidden so its loan history stays valid
    Archived,
}

#[derive(Clone)]
pub struct RecordsService {
    repository: Repository,
    locks: BookLocks,
}

impl RecordsService {
    pub fn new(repository: Repository, locks: BookLocks) -> Self {
        Self { repository, locks }
    }

    // ---- Authors ----

    pub async fn add_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        let created = AuthorsRepository::create(&self.repository.pool, &author.name).await?;
        tracing::info!("Author {} added", created.id);
        Ok(created)
    }

    /// Correct an author's name
    pub async fn rename_author(&self, id: i64, update: UpdateAuthor) -> AppResult<Author> {
        update.validate()?;
        AuthorsRepository::update_name(&self.repository.pool, id, &update.name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Delete an author no book refers to, archived books included
    pub async fn delete_author(&self, id: i64) -> AppResult<()> {
        retry_on_busy(move || self.try_delete_author(id)).await?;
        tracing::info!("Author {} deleted", id);
        Ok(())
    }

    async fn try_delete_author(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin_write().await?;

        if !AuthorsRepository::exists(&mut *tx, id).await? {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        if BooksRepository::count_by_author(&mut *tx, id).await? > 0 {
            return Err(AppError::AuthorInUse(id));
        }
        AuthorsRepository::delete(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // ---- Books ----

    /// Add a book by an existing author; it starts available
    pub async fn add_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        let book = &book;
        let created = retry_on_busy(move || self.try_add_book(book)).await?;

        tracing::info!("Book {} added (author {})", created.id, created.author_id);
        Ok(created)
    }

    async fn try_add_book(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tx = self.repository.begin_write().await?;
        references::validate_book_refs(&mut tx, book.author_id).await?;
        let created = BooksRepository::create(&mut *tx, book).await?;
        tx.commit().await?;
        Ok(created)
    }

    pub async fn update_book_title(&self, id: i64, title: String) -> AppResult<Book> {
        self.update_book(
            id,
            UpdateBook {
                title: Some(title),
                ..UpdateBook::default()
            },
        )
        .await
    }

    /// Partial update; a changed author is validated like on creation
    pub async fn update_book(&self, id: i64, update: UpdateBook) -> AppResult<Book> {
        update.validate()?;
        if update.is_empty() {
            return self.repository.books.get_by_id(id).await;
        }

        let update = &update;
        retry_on_busy(move || self.try_update_book(id, update)).await
    }

    async fn try_update_book(&self, id: i64, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.repository.begin_write().await?;

        let not_found = || AppError::NotFound(format!("Book with id {} not found", id));

        BooksRepository::fetch(&mut *tx, id)
            .await?
            .filter(|book| !book.is_archived())
            .ok_or_else(not_found)?;

        if let Some(author_id) = update.author_id {
            references::validate_book_refs(&mut tx, author_id).await?;
        }

        let book = BooksRepository::update(&mut *tx, id, update)
            .await?
            .ok_or_else(not_found)?;

        tx.commit().await?;
        Ok(book)
    }

    /// Remove a book from the catalog.
    ///
    /// Refused while the book is on loan. A book that was never lent is
    /// deleted; one with loan history is archived instead.
    pub async fn delete_book(&self, id: i64) -> AppResult<BookRemoval> {
        let _guard = self.locks.lock(id).await;

        let removal = retry_on_busy(move || self.try_delete_book(id)).await?;

        tracing::info!("Book {} removed ({:?})", id, removal);
        Ok(removal)
    }

    async fn try_delete_book(&self, id: i64) -> AppResult<BookRemoval> {
        let mut tx = self.repository.begin_write().await?;

        let book = BooksRepository::fetch(&mut *tx, id)
            .await?
            .filter(|book| !book.is_archived())
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if book.is_borrowed {
            return Err(AppError::BookBorrowed(id));
        }

        let removal = if LoansRepository::count_for_book(&mut *tx, id).await? > 0 {
            BooksRepository::archive(&mut *tx, id).await?;
            BookRemoval::Archived
        } else {
            BooksRepository::delete(&mut *tx, id).await?;
            BookRemoval::Deleted
        };

        tx.commit().await?;
        Ok(removal)
    }

    // ---- Borrowers ----

    pub async fn add_borrower(&self, borrower: CreateBorrower) -> AppResult<Borrower> {
        borrower.validate()?;
        let created = BorrowersRepository::create(&self.repository.pool, &borrower).await?;
        tracing::info!("Borrower {} added", created.id);
        Ok(created)
    }

    pub async fn update_borrower(&self, id: i64, update: UpdateBorrower) -> AppResult<Borrower> {
        update.validate()?;
        BorrowersRepository::update(&self.repository.pool, id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    /// Delete a borrower who has never borrowed anything
    pub async fn delete_borrower(&self, id: i64) -> AppResult<()> {
        retry_on_busy(move || self.try_delete_borrower(id)).await?;
        tracing::info!("Borrower {} deleted", id);
        Ok(())
    }

    async fn try_delete_borrower(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin_write().await?;

        if !BorrowersRepository::exists(&mut *tx, id).await? {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }
        if LoansRepository::count_for_borrower(&mut *tx, id).await? > 0 {
            return Err(AppError::BorrowerHasLoans(id));
        }
        BorrowersRepository::delete(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }
}
