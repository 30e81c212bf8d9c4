//! Lending endpoints: borrow, return and loan history

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{LoanHistoryQuery, LoanRecord},
};

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Borrower ID
    pub borrower_id: i64,
    /// Borrow date (YYYY-MM-DD), defaults to today
    pub date: Option<NaiveDate>,
}

/// Return request
#[derive(Deserialize, Default, ToSchema)]
pub struct ReturnRequest {
    /// Return date (YYYY-MM-DD), defaults to today
    pub date: Option<NaiveDate>,
}

/// Loan response
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    /// Status message
    pub status: String,
    pub loan: LoanRecord,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "loans",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = LoanResponse),
        (status = 404, description = "Unknown book or borrower"),
        (status = 409, description = "Book already borrowed")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i64>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let date = request.date.unwrap_or_else(today);
    let loan = state
        .services
        .lending
        .borrow_book(book_id, request.borrower_id, date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            status: "borrowed".to_string(),
            loan,
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "loans",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 400, description = "Return date before borrow date"),
        (status = 404, description = "Unknown book"),
        (status = 409, description = "Book is not borrowed")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i64>,
    request: Option<Json<ReturnRequest>>,
) -> AppResult<Json<LoanResponse>> {
    let date = request
        .and_then(|Json(request)| request.date)
        .unwrap_or_else(today);
    let loan = state.services.lending.return_book(book_id, date).await?;

    Ok(Json(LoanResponse {
        status: "returned".to_string(),
        loan,
    }))
}

/// Loan history by book and/or borrower
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanHistoryQuery),
    responses(
        (status = 200, description = "Loan records, oldest first", body = Vec<LoanRecord>),
        (status = 400, description = "Neither book_id nor borrower_id given")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanHistoryQuery>,
) -> AppResult<Json<Vec<LoanRecord>>> {
    let loans = state.services.catalog.list_loan_history(&query).await?;
    Ok(Json(loans))
}

/// Get a loan record by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan record", body = LoanRecord),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<LoanRecord>> {
    let loan = state.services.catalog.get_loan(id).await?;
    Ok(Json(loan))
}

/// Loan history of a book
#[utoipa::path(
    get,
    path = "/books/{id}/loans",
    tag = "loans",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Loan records of the book", body = Vec<LoanRecord>)
    )
)]
pub async fn get_book_loans(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i64>,
) -> AppResult<Json<Vec<LoanRecord>>> {
    let loans = state
        .services
        .catalog
        .list_loan_history(&LoanHistoryQuery::for_book(book_id))
        .await?;
    Ok(Json(loans))
}

/// Loan history of a borrower
#[utoipa::path(
    get,
    path = "/borrowers/{id}/loans",
    tag = "loans",
    params(("id" = i64, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Loan records of the borrower", body = Vec<LoanRecord>)
    )
)]
pub async fn get_borrower_loans(
    State(state): State<crate::AppState>,
    Path(borrower_id): Path<i64>,
) -> AppResult<Json<Vec<LoanRecord>>> {
    let loans = state
        .services
        .catalog
        .list_loan_history(&LoanHistoryQuery::for_borrower(borrower_id))
        .await?;
    Ok(Json(loans))
}
