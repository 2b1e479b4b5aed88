//! PostgreSQLアダプターの統合テスト
//!
//! DATABASE_URL のデータベースが必要なため、通常は無視される。
//! `cargo test -- --ignored` で実行する。

use chrono::NaiveDate;
use library_lending::adapters::postgres::{PostgresBookRepository, PostgresLoanRepository};
use library_lending::domain::{Book, BookId, Loan, LoanFilter, PageRequest};
use library_lending::ports::{
    BookRepository, IsbnConflict, LoanRepository, OpenLoanConflict,
};
use serial_test::serial;
use sqlx::PgPool;

mod common;

async fn setup() -> (PgPool, PostgresBookRepository, PostgresLoanRepository) {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    (
        pool.clone(),
        PostgresBookRepository::new(pool.clone()),
        PostgresLoanRepository::new(pool),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn save_book(books: &PostgresBookRepository, isbn: &str) -> Book {
    books
        .save(&Book::new("As aventuras", "Arthur", isbn))
        .await
        .unwrap()
}

async fn save_loan(
    loans: &PostgresLoanRepository,
    book: &Book,
    customer: &str,
    on: NaiveDate,
    returned: bool,
) -> Loan {
    let loan = Loan {
        returned,
        ..Loan::new(book.id.unwrap(), customer, "c@email.com", on)
    };
    loans.save(&loan).await.unwrap()
}

// ============================================================================
// Books
// ============================================================================

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_book_crud() {
    let (_pool, books, _) = setup().await;

    let saved = save_book(&books, "001").await;
    let id = saved.id.unwrap();
    assert!(books.exists_by_isbn("001").await.unwrap());
    assert_eq!(books.find_by_id(id).await.unwrap(), Some(saved.clone()));
    assert_eq!(books.find_by_isbn("001").await.unwrap(), Some(saved.clone()));

    let updated = books
        .update(
            id,
            &Book {
                title: "Novo".to_string(),
                ..saved
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Novo");

    books.delete(id).await.unwrap();
    assert!(books.find_by_id(id).await.unwrap().is_none());
    assert!(
        books
            .update(id, &updated)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_long_text_is_stored() {
    let (_pool, books, loans) = setup().await;
    let long_book = Book::new("t".repeat(300), "a".repeat(300), "9".repeat(100));

    let saved = books.save(&long_book).await.unwrap();
    assert_eq!(saved.title.len(), 300);
    assert_eq!(saved.isbn.len(), 100);

    let customer = "c".repeat(300);
    let loan = save_loan(&loans, &saved, &customer, date(2024, 3, 1), false).await;
    assert_eq!(loan.customer, customer);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_duplicated_isbn_is_conflict() {
    let (_pool, books, _) = setup().await;
    save_book(&books, "001").await;

    let err = books
        .save(&Book::new("Outro", "Outra", "001"))
        .await
        .unwrap_err();

    assert!(err.is::<IsbnConflict>());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_missing_book_is_none() {
    let (_pool, books, _) = setup().await;

    assert!(books.find_by_id(BookId::from_i64(1)).await.unwrap().is_none());
}

// ============================================================================
// Loans
// ============================================================================

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_second_open_loan_is_conflict() {
    let (_pool, books, loans) = setup().await;
    let book = save_book(&books, "001").await;
    save_loan(&loans, &book, "X", date(2024, 3, 1), false).await;

    assert!(loans.exists_open_loan_for_book(book.id.unwrap()).await.unwrap());
    let err = loans
        .save(&Loan::new(book.id.unwrap(), "Y", "y@email.com", date(2024, 3, 2)))
        .await
        .unwrap_err();

    assert!(err.is::<OpenLoanConflict>());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_filter() {
    let (_pool, books, loans) = setup().await;
    let a = save_book(&books, "A").await;
    let b = save_book(&books, "B").await;
    let first = save_loan(&loans, &a, "X", date(2024, 3, 1), true).await;
    let second = save_loan(&loans, &a, "Y", date(2024, 3, 1), false).await;
    let third = save_loan(&loans, &b, "X", date(2024, 3, 1), false).await;

    let by_isbn = LoanFilter {
        isbn: Some("a".to_string()),
        customer: None,
    };
    let page = loans
        .find_by_filter(&by_isbn, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.content, vec![first.clone(), second.clone()]);

    let by_customer = LoanFilter {
        isbn: None,
        customer: Some("X".to_string()),
    };
    let page = loans
        .find_by_filter(&by_customer, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.content, vec![first.clone(), third.clone()]);

    let page = loans
        .find_by_filter(&LoanFilter::default(), PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.content, vec![third]);
    assert_eq!(page.total_elements, 3);

    let page = loans
        .find_by_book(a.id.unwrap(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.content, vec![first, second]);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_find_late() {
    let (_pool, books, loans) = setup().await;
    let a = save_book(&books, "A").await;
    let b = save_book(&books, "B").await;
    let c = save_book(&books, "C").await;
    let late = save_loan(&loans, &a, "X", date(2024, 3, 1), false).await;
    save_loan(&loans, &b, "Y", date(2024, 3, 1), true).await;
    save_loan(&loans, &c, "Z", date(2024, 3, 6), false).await;

    let found = loans.find_late(date(2024, 3, 6)).await.unwrap();

    assert_eq!(found, vec![late]);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_deleting_book_removes_its_loans() {
    let (_pool, books, loans) = setup().await;
    let book = save_book(&books, "A").await;
    let loan = save_loan(&loans, &book, "X", date(2024, 3, 1), false).await;

    books.delete(book.id.unwrap()).await.unwrap();

    assert!(loans.find_by_id(loan.id.unwrap()).await.unwrap().is_none());
}
