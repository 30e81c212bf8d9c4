//! Authors repository for database operations

use sqlx::{Executor, Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::author::Author,
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Sqlite>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert a new author and return the stored row
    pub async fn create<'e, E>(executor: E, name: &str) -> AppResult<Author>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES (?) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(author)
    }

    pub async fn fetch<'e, E>(executor: E, id: i64) -> AppResult<Option<Author>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let author = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(author)
    }

    pub async fn exists<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Correct an author's name
    pub async fn update_name<'e, E>(executor: E, id: i64, name: &str) -> AppResult<Option<Author>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = ? WHERE id = ? RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(author)
    }

    /// Returns true if a row was removed
    pub async fn delete<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        Self::fetch(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// List all authors
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>("SELECT id, name FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(authors)
    }

    pub async fn count<'e, E>(executor: E) -> AppResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_repository;

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let repo = memory_repository().await;

        let first = AuthorsRepository::create(&repo.pool, "First").await.unwrap();
        assert!(AuthorsRepository::delete(&repo.pool, first.id).await.unwrap());

        let second = AuthorsRepository::create(&repo.pool, "Second").await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_update_missing_author() {
        let repo = memory_repository().await;
        let updated = AuthorsRepository::update_name(&repo.pool, 42, "Nobody").await.unwrap();
        assert!(updated.is_none());
        assert!(matches!(repo.authors.get_by_id(42).await, Err(AppError::NotFound(_))));
    }
}
