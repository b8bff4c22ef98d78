//! Loans repository: the loan ledger.
//!
//! Create and return run as single transactions that lock the affected book
//! row (`SELECT ... FOR UPDATE`), so no concurrent request can observe a book
//! as available between the availability check and the flag flip.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Availability, Book, CopySlot},
        loan::{Loan, LoanDetails, LoanType},
    },
};

/// Clear the slot currently held on a book, inside an open transaction.
/// The caller must hold a row lock on the book. Returns are released in
/// mirrored priority: the copy flag first, then the primary flag.
pub(crate) async fn release_book_slot(
    tx: &mut Transaction<'_, Postgres>,
    book: &Book,
) -> AppResult<()> {
    let column = match book.slot_to_release() {
        Some(CopySlot::Secondary) => "copy_status",
        Some(CopySlot::Primary) => "status",
        None => return Ok(()),
    };

    sqlx::query(&format!("UPDATE books SET {} = $1 WHERE id = $2", column))
        .bind(Availability::Available)
        .bind(book.id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::LoanNotFound(id))
    }

    /// Create a new loan (borrow a book). Atomically checks availability,
    /// claims one copy slot and inserts the loan row.
    pub async fn create(&self, user_id: i32, book_id: i32) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let already_loaned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_loaned {
            return Err(AppError::AlreadyLoaned);
        }

        // Lock the book row for the whole check-then-flip sequence
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::BookNotFound(book_id))?;

        let slot = book.slot_to_claim().ok_or(AppError::BookUnavailable)?;

        let loan_type =
            LoanType::from_code(book.loan_type).ok_or(AppError::InvalidLoanType(book.loan_type))?;
        let due_date = now + loan_type.duration();

        let column = match slot {
            CopySlot::Primary => "status",
            CopySlot::Secondary => "copy_status",
        };
        sqlx::query(&format!("UPDATE books SET {} = $1 WHERE id = $2", column))
            .bind(Availability::Taken)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Return a loan: delete the loan row and release the copy slot it held.
    ///
    /// If the referenced book no longer exists, the loan deletion is still
    /// committed and the missing book is surfaced to the caller.
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::LoanNotFound(loan_id))?;

        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(loan.book_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(book) = book else {
            // The catalog entry is gone; the return still stands.
            tx.commit().await?;
            return Err(AppError::BookNotFound(loan.book_id));
        };

        release_book_slot(&mut tx, &book).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get active loans for a user, with book details and late flags
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id as loan_id, l.user_id, l.loan_date, l.due_date,
                   b.id as book_id, b.title, b.author, b.year_published,
                   b.description, b.cover
            FROM loans l
            JOIN books b ON l.book_id = b.id
            WHERE l.user_id = $1
            ORDER BY l.loan_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();

        let loans = rows
            .into_iter()
            .map(|row| {
                let due_date: chrono::DateTime<Utc> = row.get("due_date");
                LoanDetails {
                    loan_id: row.get("loan_id"),
                    user_id: None,
                    book_id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    year_published: row.get("year_published"),
                    description: row.get("description"),
                    cover: row.get("cover"),
                    loan_date: row.get("loan_date"),
                    due_date,
                    late: due_date < now,
                }
            })
            .collect();

        Ok(loans)
    }

    /// Get all active loans across users, including the borrower's id
    pub async fn get_all_loans(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id as loan_id, l.user_id, l.loan_date, l.due_date,
                   b.id as book_id, b.title, b.author, b.year_published,
                   b.description, b.cover
            FROM loans l
            JOIN books b ON l.book_id = b.id
            ORDER BY l.loan_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();

        let loans = rows
            .into_iter()
            .map(|row| {
                let due_date: chrono::DateTime<Utc> = row.get("due_date");
                LoanDetails {
                    loan_id: row.get("loan_id"),
                    user_id: Some(row.get("user_id")),
                    book_id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    year_published: row.get("year_published"),
                    description: row.get("description"),
                    cover: row.get("cover"),
                    loan_date: row.get("loan_date"),
                    due_date,
                    late: due_date < now,
                }
            })
            .collect();

        Ok(loans)
    }

    /// Find the caller's active loan on a book, or any active loan when
    /// `any_user` is set (admins see whoever holds the book).
    pub async fn find_for_book(
        &self,
        book_id: i32,
        user_id: i32,
        any_user: bool,
    ) -> AppResult<Option<Loan>> {
        let loan = if any_user {
            sqlx::query_as::<_, Loan>(
                "SELECT * FROM loans WHERE book_id = $1 ORDER BY id LIMIT 1",
            )
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Loan>(
                "SELECT * FROM loans WHERE book_id = $1 AND user_id = $2",
            )
            .bind(book_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
        };

        Ok(loan)
    }
}
