//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::loan::LoanDetails};

use super::AuthenticatedUser;

/// Create loan request
#[derive(Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Book ID to borrow
    pub book_id: i32,
}

/// Loan response with the computed due date
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    /// Loan ID
    pub id: i32,
    /// Due date (ISO 8601 format)
    pub due_date: DateTime<Utc>,
    /// Status message
    pub message: String,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
}

/// Loan list response
#[derive(Serialize, ToSchema)]
pub struct LoanListResponse {
    pub loans: Vec<LoanDetails>,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 400, description = "Unrecognized loan type"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already loaned or no copy available")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let (loan_id, due_date) = state
        .services
        .loans
        .create_loan(claims.user_id, request.book_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            id: loan_id,
            due_date,
            message: "Book loaned successfully".to_string(),
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 403, description = "Not the borrower or an admin"),
        (status = 404, description = "Loan or referenced book not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    state
        .services
        .loans
        .return_loan(loan_id, claims.user_id, claims.role)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
    }))
}

/// List the caller's active loans
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own active loans with late flags", body = LoanListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoanListResponse>> {
    let loans = state.services.loans.get_user_loans(claims.user_id).await?;
    Ok(Json(LoanListResponse { loans }))
}

/// List all active loans across users
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All active loans with borrower ids", body = LoanListResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_all_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoanListResponse>> {
    claims.require_admin()?;

    let loans = state.services.loans.get_all_loans().await?;
    Ok(Json(LoanListResponse { loans }))
}
