use thiserror::Error;

/// 書籍管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookApplicationError {
    /// ISBNが既に登録されている
    #[error("Isbn already registered.")]
    DuplicateIsbn,

    /// 必須の識別子がない
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 更新対象の書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookApplicationError>;
