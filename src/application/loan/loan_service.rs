use crate::application::ServiceDependencies;
use crate::domain::{self, Book, BookId, Loan, LoanFilter, LoanId, Page, PageRequest};
use crate::ports::OpenLoanConflict;
use chrono::NaiveDate;

use super::errors::{LoanApplicationError, Result};

fn map_save_error(err: Box<dyn std::error::Error + Send + Sync>) -> LoanApplicationError {
    if err.is::<OpenLoanConflict>() {
        LoanApplicationError::BookAlreadyLoaned
    } else {
        LoanApplicationError::LoanRepositoryError(err)
    }
}

/// 貸出を登録する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 書籍に未返却の貸出がないこと（1冊につき貸出中は1件まで）
///
/// ストレージ側の部分一意インデックスでも同じ規則を強制しており、
/// 同時登録による違反も BookAlreadyLoaned として返す。
pub async fn save_loan(deps: &ServiceDependencies, loan: Loan) -> Result<Loan> {
    // 1. 書籍の存在確認
    let book = deps
        .book_repository
        .find_by_id(loan.book_id)
        .await
        .map_err(LoanApplicationError::BookRepositoryError)?;

    if book.is_none() {
        return Err(LoanApplicationError::BookNotFound);
    }

    // 2. 未返却の貸出がないか確認
    let already_loaned = deps
        .loan_repository
        .exists_open_loan_for_book(loan.book_id)
        .await
        .map_err(LoanApplicationError::LoanRepositoryError)?;

    if already_loaned {
        return Err(LoanApplicationError::BookAlreadyLoaned);
    }

    // 3. 保存
    let saved = deps
        .loan_repository
        .save(&loan)
        .await
        .map_err(map_save_error)?;

    tracing::debug!(loan_id = ?saved.id, book_id = saved.book_id.value(), "loan saved");
    Ok(saved)
}

/// ISBNで指定された書籍を貸し出す
///
/// ISBNに一致する書籍がない場合は BookNotFound。
pub async fn lend_book(
    deps: &ServiceDependencies,
    isbn: &str,
    customer: &str,
    customer_email: &str,
    loan_date: NaiveDate,
) -> Result<Loan> {
    let book = deps
        .book_repository
        .find_by_isbn(isbn)
        .await
        .map_err(LoanApplicationError::BookRepositoryError)?
        .ok_or(LoanApplicationError::BookNotFound)?;

    let book_id = book.id.ok_or(LoanApplicationError::BookNotFound)?;

    save_loan(
        deps,
        Loan::new(book_id, customer, customer_email, loan_date),
    )
    .await
}

/// IDで貸出を取得する
///
/// 見つからない場合は None。
pub async fn get_loan_by_id(deps: &ServiceDependencies, id: LoanId) -> Result<Option<Loan>> {
    deps.loan_repository
        .find_by_id(id)
        .await
        .map_err(LoanApplicationError::LoanRepositoryError)
}

/// 貸出を更新する
///
/// 前提条件：loan.id が設定されていること。
pub async fn update_loan(deps: &ServiceDependencies, loan: Loan) -> Result<Loan> {
    let id = loan.id.ok_or_else(|| {
        LoanApplicationError::InvalidArgument("Loan id cannot be null on update".to_string())
    })?;

    deps.loan_repository
        .update(id, &loan)
        .await
        .map_err(map_save_error)?
        .ok_or(LoanApplicationError::LoanNotFound)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 既に返却済みでないこと
pub async fn return_book(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Loan> {
    let loan = get_loan_by_id(deps, loan_id)
        .await?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    let returned = domain::loan::return_loan(&loan).map_err(|e| match e {
        domain::ReturnLoanError::AlreadyReturned => {
            LoanApplicationError::InvalidLoanState("Loan already returned".to_string())
        }
    })?;

    update_loan(deps, returned).await
}

/// 条件に一致する貸出をページングして取得する
///
/// 空の条件は全件を対象とする。
pub async fn find_loans(
    deps: &ServiceDependencies,
    filter: &LoanFilter,
    page: PageRequest,
) -> Result<Page<Loan>> {
    deps.loan_repository
        .find_by_filter(filter, page)
        .await
        .map_err(LoanApplicationError::LoanRepositoryError)
}

/// 書籍の貸出履歴をページングして取得する
///
/// 前提条件：book.id が設定されていること。
pub async fn get_loans_by_book(
    deps: &ServiceDependencies,
    book: &Book,
    page: PageRequest,
) -> Result<Page<Loan>> {
    let book_id: BookId = book.id.ok_or_else(|| {
        LoanApplicationError::InvalidArgument("Book id cannot be null".to_string())
    })?;

    deps.loan_repository
        .find_by_book(book_id, page)
        .await
        .map_err(LoanApplicationError::LoanRepositoryError)
}
