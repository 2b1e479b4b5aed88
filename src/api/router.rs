use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_book, create_loan, delete_book, get_book, get_loan, list_book_loans,
    list_loans, update_book, update_loan_returned,
};

/// Creates the API router with all book and loan endpoints
///
/// Books:
/// - POST /api/books, GET|PUT|DELETE /api/books/:id
/// - GET /api/books/:id/loans
///
/// Loans:
/// - POST|GET /api/loans
/// - GET|PATCH /api/loans/:id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/api/books", post(create_book))
        .route(
            "/api/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/api/books/:id/loans", get(list_book_loans))
        .route("/api/loans", post(create_loan).get(list_loans))
        .route("/api/loans/:id", get(get_loan).patch(update_loan_returned))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
