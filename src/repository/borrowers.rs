//! Borrowers repository for database operations

use sqlx::{Executor, Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Sqlite>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(executor: E, borrower: &CreateBorrower) -> AppResult<Borrower>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let created = sqlx::query_as::<_, Borrower>(
            "INSERT INTO borrowers (name, email) VALUES (?, ?) RETURNING id, name, email",
        )
        .bind(&borrower.name)
        .bind(&borrower.email)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn fetch<'e, E>(executor: E, id: i64) -> AppResult<Option<Borrower>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let borrower =
            sqlx::query_as::<_, Borrower>("SELECT id, name, email FROM borrowers WHERE id = ?")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(borrower)
    }

    pub async fn exists<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE id = ?)")
                .bind(id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        update: &UpdateBorrower,
    ) -> AppResult<Option<Borrower>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let borrower = sqlx::query_as::<_, Borrower>(
            r#"
            UPDATE borrowers
            SET name = COALESCE(?, name),
                email = COALESCE(?, email)
            WHERE id = ?
            RETURNING id, name, email
            "#,
        )
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(borrower)
    }

    /// Returns true if a row was removed
    pub async fn delete<'e, E>(executor: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM borrowers WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get borrower by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Borrower> {
        Self::fetch(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        let borrowers =
            sqlx::query_as::<_, Borrower>("SELECT id, name, email FROM borrowers ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(borrowers)
    }

    pub async fn count<'e, E>(executor: E) -> AppResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowers")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
