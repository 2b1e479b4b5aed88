use crate::domain::{BookId, Loan, LoanFilter, LoanId, Page, PageRequest};
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 同一書籍に対する未返却貸出の重複
///
/// ストレージの部分一意インデックス違反をアダプターがこの型で返す。
#[derive(Debug, Error)]
#[error("book {} already has an open loan", book_id.value())]
pub struct OpenLoanConflict {
    pub book_id: BookId,
}

/// 貸出リポジトリポート
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 新しい貸出を保存し、採番済みの貸出を返す
    async fn save(&self, loan: &Loan) -> Result<Loan>;

    /// IDで貸出を取得する
    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>>;

    /// 既存貸出を上書きする
    ///
    /// 行が存在しない場合は None。
    async fn update(&self, id: LoanId, loan: &Loan) -> Result<Option<Loan>>;

    /// 条件に一致する貸出をページングして返す
    ///
    /// 並び順は貸出ID昇順。total_elementsは一致した全件数。
    async fn find_by_filter(&self, filter: &LoanFilter, page: PageRequest) -> Result<Page<Loan>>;

    /// 書籍を参照する貸出をページングして返す
    async fn find_by_book(&self, book_id: BookId, page: PageRequest) -> Result<Page<Loan>>;

    /// 延滞候補を検索する
    ///
    /// returned = false かつ loan_date < threshold の貸出を返す。
    async fn find_late(&self, threshold: NaiveDate) -> Result<Vec<Loan>>;

    /// 書籍に未返却の貸出があるか確認する
    async fn exists_open_loan_for_book(&self, book_id: BookId) -> Result<bool>;
}
