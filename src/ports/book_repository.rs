use crate::domain::{Book, BookId};
use async_trait::async_trait;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// ISBNの一意制約違反
///
/// アダプターはストレージの一意制約違反をこの型で返す。
/// 存在確認と挿入の間の競合をアプリケーション層で
/// DuplicateIsbn として扱うために使用される。
#[derive(Debug, Error)]
#[error("isbn already registered: {isbn}")]
pub struct IsbnConflict {
    pub isbn: String,
}

/// 書籍リポジトリポート
///
/// 書籍の永続化を抽象化する。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 指定ISBNの書籍が存在するか確認する
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool>;

    /// ISBNで書籍を取得する
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// 新しい書籍を保存する
    ///
    /// book.id は無視され、ストアが採番したIDを持つ書籍を返す。
    /// ISBNが重複する場合は `IsbnConflict` を返す。
    async fn save(&self, book: &Book) -> Result<Book>;

    /// IDで書籍を取得する
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>>;

    /// 既存書籍のtitle/author/isbnを上書きする
    ///
    /// 行が存在しない場合は None。
    async fn update(&self, id: BookId, book: &Book) -> Result<Option<Book>>;

    /// IDで書籍を削除する
    async fn delete(&self, id: BookId) -> Result<()>;
}
