use crate::application::{
    ServiceDependencies,
    book::{self, BookApplicationError},
    loan,
};
use crate::domain::{Book, BookId, Loan, LoanId, Page};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        BookRequest, BookResponse, ListLoansQuery, LoanRequest, LoanResponse, PageQuery,
        PageResponse, ReturnedLoanRequest,
    },
    validation::validate_request,
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// 書籍を取得し、存在しなければ404にする
async fn find_book_or_404(deps: &ServiceDependencies, id: i64) -> Result<Book, ApiError> {
    book::get_book_by_id(deps, BookId::from_i64(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))
}

/// 貸出に参照先の書籍を添えてレスポンスに変換する
///
/// 同じ書籍は一度だけ取得する。
async fn to_loan_page_response(
    deps: &ServiceDependencies,
    page: Page<Loan>,
) -> Result<PageResponse<LoanResponse>, ApiError> {
    let mut books: HashMap<BookId, Option<Book>> = HashMap::new();
    for loan in &page.content {
        if !books.contains_key(&loan.book_id) {
            let book = book::get_book_by_id(deps, loan.book_id).await?;
            books.insert(loan.book_id, book);
        }
    }

    let page = page.map(|loan| {
        let book = books.get(&loan.book_id).cloned().flatten();
        LoanResponse::new(loan, book)
    });
    Ok(PageResponse::from(page))
}

async fn to_loan_response(deps: &ServiceDependencies, loan: Loan) -> Result<LoanResponse, ApiError> {
    let book = book::get_book_by_id(deps, loan.book_id).await?;
    Ok(LoanResponse::new(loan, book))
}

// ============================================================================
// Book handlers
// ============================================================================

/// POST /api/books - 書籍を登録
///
/// 強制されるビジネスルール:
/// - title, author, isbn が空でないこと
/// - isbn が未登録であること
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    validate_request(&req)?;

    let saved = book::save_book(&state.service_deps, req.to_book()).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(saved))))
}

/// GET /api/books/:id - 書籍詳細を取得
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = find_book_or_404(&state.service_deps, id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// PUT /api/books/:id - 書籍を更新
///
/// 存在しない書籍は404。
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    validate_request(&req)?;

    let existing = find_book_or_404(&state.service_deps, id).await?;
    let updating = Book {
        title: req.title,
        author: req.author,
        isbn: req.isbn,
        ..existing
    };

    let updated = book::update_book(&state.service_deps, updating)
        .await
        .map_err(|e| match e {
            BookApplicationError::BookNotFound => {
                ApiError::NotFound(format!("Book {} not found", id))
            }
            other => ApiError::from(other),
        })?;

    Ok(Json(BookResponse::from(updated)))
}

/// DELETE /api/books/:id - 書籍を削除
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let existing = find_book_or_404(&state.service_deps, id).await?;
    book::delete_book(&state.service_deps, &existing).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books/:id/loans - 書籍の貸出履歴
pub async fn list_book_loans(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<LoanResponse>>, ApiError> {
    let book = find_book_or_404(&state.service_deps, id).await?;

    let page =
        loan::get_loans_by_book(&state.service_deps, &book, query.to_page_request()).await?;

    let response = PageResponse::from(
        page.map(|loan| LoanResponse::new(loan, Some(book.clone()))),
    );
    Ok(Json(response))
}

// ============================================================================
// Loan handlers
// ============================================================================

/// POST /api/loans - ISBNで指定した書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - ISBNに一致する書籍が存在すること
/// - 書籍が貸出中でないこと
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    validate_request(&req)?;

    let today = chrono::Utc::now().date_naive();
    let loan = loan::lend_book(
        &state.service_deps,
        &req.isbn,
        &req.customer,
        &req.email,
        today,
    )
    .await?;

    let response = to_loan_response(&state.service_deps, loan).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/loans/:id - 貸出詳細を取得
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = loan::get_loan_by_id(&state.service_deps, LoanId::from_i64(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;

    Ok(Json(to_loan_response(&state.service_deps, loan).await?))
}

/// PATCH /api/loans/:id - 返却状態を更新
///
/// returned = true で返却。false は貸出中に戻す（未返却貸出の重複規則に従う）。
pub async fn update_loan_returned(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ReturnedLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan_id = LoanId::from_i64(id);
    let existing = loan::get_loan_by_id(&state.service_deps, loan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;

    let updated = if req.returned {
        loan::return_book(&state.service_deps, loan_id).await?
    } else if existing.returned {
        loan::update_loan(
            &state.service_deps,
            Loan {
                returned: false,
                ..existing
            },
        )
        .await?
    } else {
        existing
    };

    Ok(Json(to_loan_response(&state.service_deps, updated).await?))
}

/// GET /api/loans - 条件付き貸出一覧
///
/// クエリパラメータ:
/// - isbn: 書籍のISBNでフィルタリング（オプション）
/// - customer: 顧客名でフィルタリング（オプション）
/// - page, size: ページング（0始まり）
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<PageResponse<LoanResponse>>, ApiError> {
    let page = loan::find_loans(
        &state.service_deps,
        &query.to_filter(),
        query.to_page_request(),
    )
    .await?;

    Ok(Json(to_loan_page_response(&state.service_deps, page).await?))
}
