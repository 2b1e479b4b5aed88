use crate::application::{book::BookApplicationError, loan::LoanApplicationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{types::ErrorResponse, validation::FieldError};

/// API層のエラー型
///
/// アプリケーション層のエラーとバリデーションエラーをまとめ、
/// HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Book(BookApplicationError),
    Loan(LoanApplicationError),
    Validation(Vec<FieldError>),
    NotFound(String),
}

impl From<BookApplicationError> for ApiError {
    fn from(err: BookApplicationError) -> Self {
        ApiError::Book(err)
    }
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

fn internal_error(context: &str, source: &(dyn std::error::Error + Send + Sync)) -> Response {
    // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
    tracing::error!("{}: {}", context, source);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("An unexpected error occurred")),
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // 400 Bad Request - 項目ごとのエラー一覧
            ApiError::Validation(errors) => {
                let messages = errors.iter().map(ToString::to_string).collect();
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::from_messages(messages)),
                )
                    .into_response()
            }

            // 404 Not Found - リクエストされたリソースが存在しない
            ApiError::NotFound(message) => not_found(message),

            ApiError::Book(err) => match err {
                BookApplicationError::DuplicateIsbn
                | BookApplicationError::InvalidArgument(_) => bad_request(err.to_string()),
                BookApplicationError::BookNotFound => not_found(err.to_string()),
                BookApplicationError::RepositoryError(ref e) => {
                    internal_error("Book repository error", e.as_ref())
                }
            },

            ApiError::Loan(err) => match err {
                // 貸出作成時のISBN不一致は入力の誤りとして扱う
                LoanApplicationError::BookNotFound
                | LoanApplicationError::BookAlreadyLoaned
                | LoanApplicationError::InvalidLoanState(_)
                | LoanApplicationError::InvalidArgument(_) => bad_request(err.to_string()),
                LoanApplicationError::LoanNotFound => not_found(err.to_string()),
                LoanApplicationError::BookRepositoryError(ref e) => {
                    internal_error("Book repository error", e.as_ref())
                }
                LoanApplicationError::LoanRepositoryError(ref e) => {
                    internal_error("Loan repository error", e.as_ref())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_isbn_is_bad_request() {
        let response = ApiError::from(BookApplicationError::DuplicateIsbn).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_loan_not_found_is_not_found() {
        let response = ApiError::from(LoanApplicationError::LoanNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_repository_error_is_internal() {
        let response =
            ApiError::from(BookApplicationError::RepositoryError("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = ApiError::from(vec![FieldError {
            field: "title".to_string(),
            message: "must not be empty".to_string(),
        }])
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
