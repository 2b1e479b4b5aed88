use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::validate_mail_address;

use crate::domain::{Book, Loan, LoanFilter, Page, PageRequest, value_objects::DEFAULT_PAGE_SIZE};

// ============================================================================
// Requests
// ============================================================================

/// 書籍の登録・更新リクエスト（POST /api/books, PUT /api/books/:id）
///
/// 欠けた項目は空文字として受け取り、バリデーションで弾く。
#[derive(Debug, Deserialize, Validate)]
pub struct BookRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub isbn: String,
}

impl BookRequest {
    pub fn to_book(&self) -> Book {
        Book::new(&self.title, &self.author, &self.isbn)
    }
}

/// 貸出リクエスト（POST /api/loans）
#[derive(Debug, Deserialize, Validate)]
pub struct LoanRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub customer: String,
    #[serde(default)]
    #[validate(custom(function = "validate_mail_address"))]
    pub email: String,
}

/// 返却リクエスト（PATCH /api/loans/:id）
#[derive(Debug, Deserialize)]
pub struct ReturnedLoanRequest {
    pub returned: bool,
}

/// ページングのクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// 貸出検索のクエリパラメータ（GET /api/loans）
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub isbn: Option<String>,
    pub customer: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListLoansQuery {
    pub fn to_filter(&self) -> LoanFilter {
        LoanFilter {
            isbn: self.isbn.clone(),
            customer: self.customer.clone(),
        }
    }

    pub fn to_page_request(&self) -> PageRequest {
        PageQuery {
            page: self.page,
            size: self.size,
        }
        .to_page_request()
    }
}

// ============================================================================
// Responses
// ============================================================================

/// 書籍レスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookResponse {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.map(|id| id.value()),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
        }
    }
}

/// 貸出レスポンス
///
/// bookは参照先の書籍を明示的に取得して埋める。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanResponse {
    pub id: Option<i64>,
    pub book_id: i64,
    pub customer: String,
    pub email: String,
    pub loan_date: NaiveDate,
    pub returned: bool,
    pub book: Option<BookResponse>,
}

impl LoanResponse {
    pub fn new(loan: Loan, book: Option<Book>) -> Self {
        Self {
            id: loan.id.map(|id| id.value()),
            book_id: loan.book_id.value(),
            customer: loan.customer,
            email: loan.customer_email,
            loan_date: loan.loan_date,
            returned: loan.returned,
            book: book.map(BookResponse::from),
        }
    }
}

/// ページングレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            content: page.content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn from_messages(errors: Vec<String>) -> Self {
        Self { errors }
    }
}
