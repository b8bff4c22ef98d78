//! Loan ledger service

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        loan::{Loan, LoanDetails},
        user::Role,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for a user, returning the loan id and due date
    pub async fn create_loan(&self, user_id: i32, book_id: i32) -> AppResult<(i32, DateTime<Utc>)> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;

        let loan = self.repository.loans.create(user_id, book_id).await?;
        tracing::info!(
            "Loan ledger: user {} borrowed book {} until {}",
            user_id,
            book_id,
            loan.due_date
        );
        Ok((loan.id, loan.due_date))
    }

    /// Return a borrowed book. Only the borrower or an admin may return it.
    pub async fn return_loan(
        &self,
        loan_id: i32,
        requester_id: i32,
        requester_role: Role,
    ) -> AppResult<()> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;

        if !requester_role.may_manage_loan(requester_id, loan.user_id) {
            return Err(crate::error::AppError::Authorization(
                "Only the borrower or an administrator may return this loan".to_string(),
            ));
        }

        self.repository.loans.return_loan(loan_id).await?;
        tracing::info!("Loan ledger: loan {} returned by user {}", loan_id, requester_id);
        Ok(())
    }

    /// Get a user's active loans with late flags
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.get_user_loans(user_id).await
    }

    /// Get all active loans across users (admin view)
    pub async fn get_all_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.get_all_loans().await
    }

    /// Find the active loan linking a book to the caller. Admins see any
    /// user's loan on the book.
    pub async fn loan_for_book(
        &self,
        book_id: i32,
        requester_id: i32,
        requester_role: Role,
    ) -> AppResult<Option<Loan>> {
        self.repository
            .loans
            .find_for_book(book_id, requester_id, requester_role == Role::Admin)
            .await
    }
}
