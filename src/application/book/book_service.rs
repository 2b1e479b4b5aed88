use crate::application::ServiceDependencies;
use crate::domain::{Book, BookId};
use crate::ports::IsbnConflict;

use super::errors::{BookApplicationError, Result};

/// リポジトリのエラーをアプリケーション層のエラーに変換する
///
/// 一意制約違反は存在確認をすり抜けた同時登録なので DuplicateIsbn として扱う。
fn map_repository_error(err: Box<dyn std::error::Error + Send + Sync>) -> BookApplicationError {
    if err.is::<IsbnConflict>() {
        BookApplicationError::DuplicateIsbn
    } else {
        BookApplicationError::RepositoryError(err)
    }
}

fn require_id(book: &Book, operation: &str) -> Result<BookId> {
    book.id.ok_or_else(|| {
        BookApplicationError::InvalidArgument(format!("Book id cannot be null on {}", operation))
    })
}

/// 書籍を登録する
///
/// ビジネスルール：
/// - 同じISBNの書籍が既に存在する場合は登録できない
///
/// # 戻り値
/// IDが採番された書籍
pub async fn save_book(deps: &ServiceDependencies, book: Book) -> Result<Book> {
    let exists = deps
        .book_repository
        .exists_by_isbn(&book.isbn)
        .await
        .map_err(BookApplicationError::RepositoryError)?;

    if exists {
        return Err(BookApplicationError::DuplicateIsbn);
    }

    let saved = deps
        .book_repository
        .save(&book)
        .await
        .map_err(map_repository_error)?;

    tracing::debug!(book_id = ?saved.id, isbn = %saved.isbn, "book saved");
    Ok(saved)
}

/// IDで書籍を取得する
///
/// 見つからない場合はエラーではなく None を返す。
pub async fn get_book_by_id(deps: &ServiceDependencies, id: BookId) -> Result<Option<Book>> {
    deps.book_repository
        .find_by_id(id)
        .await
        .map_err(BookApplicationError::RepositoryError)
}

/// ISBNで書籍を取得する
pub async fn get_book_by_isbn(deps: &ServiceDependencies, isbn: &str) -> Result<Option<Book>> {
    deps.book_repository
        .find_by_isbn(isbn)
        .await
        .map_err(BookApplicationError::RepositoryError)
}

/// 書籍を更新する
///
/// 前提条件：book.id が設定されていること。
/// 未設定の場合はリポジトリを呼ばずに InvalidArgument を返す。
pub async fn update_book(deps: &ServiceDependencies, book: Book) -> Result<Book> {
    let id = require_id(&book, "update")?;

    deps.book_repository
        .update(id, &book)
        .await
        .map_err(map_repository_error)?
        .ok_or(BookApplicationError::BookNotFound)
}

/// 書籍を削除する
///
/// 前提条件：book.id が設定されていること。
pub async fn delete_book(deps: &ServiceDependencies, book: &Book) -> Result<()> {
    let id = require_id(book, "delete")?;

    deps.book_repository
        .delete(id)
        .await
        .map_err(BookApplicationError::RepositoryError)?;

    tracing::debug!(book_id = id.value(), "book deleted");
    Ok(())
}
