use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 貸出対象の書籍が存在しない
    #[error("Book not found for passed isbn.")]
    BookNotFound,

    /// 書籍に未返却の貸出がある
    #[error("Book already loaned.")]
    BookAlreadyLoaned,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 貸出の状態が不正（例: 返却済みの貸出を返却）
    #[error("Invalid loan state: {0}")]
    InvalidLoanState(String),

    /// 必須の識別子がない
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    BookRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LoanRepositoryのエラー
    #[error("Loan repository error")]
    LoanRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
