//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Availability, Book, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::BookNotFound(id))
    }

    /// List the whole catalog
    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Create a new book. Both copy slots start out available.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, year_published, description, loan_type, status, copy_status)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year_published)
        .bind(&book.description)
        .bind(book.loan_type)
        .bind(Availability::Available)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update book fields; omitted fields keep their current values.
    /// Availability flags are owned by the loan ledger and never touched here.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                year_published = COALESCE($4, year_published),
                description = COALESCE($5, description),
                loan_type = COALESCE($6, loan_type)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year_published)
        .bind(&book.description)
        .bind(book.loan_type)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::BookNotFound(id))?;

        Ok(updated)
    }

    /// Record the stored cover path for a book
    pub async fn set_cover(&self, id: i32, cover: &str) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            "UPDATE books SET cover = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(cover)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::BookNotFound(id))?;

        Ok(updated)
    }

    /// Delete a book. Outstanding loans keep their rows; returning one of
    /// them later reports the missing book to the caller.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound(id));
        }

        Ok(())
    }
}
