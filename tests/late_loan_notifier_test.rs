use chrono::NaiveDate;
use library_lending::application::{
    book, loan,
    notification::{self, DailySchedule, NotificationError},
};
use library_lending::domain::Book;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod common;

const MESSAGE: &str = "Attention! You have a late loan.";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 書籍を登録して指定日に貸し出す
async fn lend(
    deps: &library_lending::application::ServiceDependencies,
    isbn: &str,
    email: &str,
    on: NaiveDate,
) {
    book::save_book(deps, Book::new("Titulo", "Autor", isbn))
        .await
        .unwrap();
    loan::lend_book(deps, isbn, "Cliente", email, on)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_no_late_loans_sends_nothing() {
    let (deps, mocks) = common::mock_dependencies();
    let today = date(2024, 3, 10);
    lend(&deps, "1", "a@email.com", today).await;

    let count = notification::notify_late_loans(&deps, MESSAGE, today)
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert!(mocks.email.sent().is_empty());
}

#[tokio::test]
async fn test_late_loans_are_sent_in_one_call() {
    let (deps, mocks) = common::mock_dependencies();
    let today = date(2024, 3, 10);
    lend(&deps, "1", "b@email.com", date(2024, 3, 1)).await;
    lend(&deps, "2", "a@email.com", date(2024, 3, 2)).await;
    // 延滞ではない
    lend(&deps, "3", "c@email.com", date(2024, 3, 8)).await;

    let count = notification::notify_late_loans(&deps, MESSAGE, today)
        .await
        .unwrap();

    assert_eq!(count, 2);
    let sent = mocks.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, MESSAGE);
    assert_eq!(sent[0].recipients, vec!["a@email.com", "b@email.com"]);
}

#[tokio::test]
async fn test_recipients_are_deduplicated() {
    let (deps, mocks) = common::mock_dependencies();
    let today = date(2024, 3, 10);
    lend(&deps, "1", "same@email.com", date(2024, 3, 1)).await;
    lend(&deps, "2", "same@email.com", date(2024, 3, 2)).await;

    let count = notification::notify_late_loans(&deps, MESSAGE, today)
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(mocks.email.sent()[0].recipients, vec!["same@email.com"]);
}

#[tokio::test]
async fn test_recipients_differing_only_in_case_are_one() {
    let (deps, mocks) = common::mock_dependencies();
    let today = date(2024, 3, 10);
    lend(&deps, "1", "Fulano@email.com", date(2024, 3, 1)).await;
    lend(&deps, "2", "fulano@email.com", date(2024, 3, 2)).await;
    lend(&deps, "3", "ciclano@email.com", date(2024, 3, 2)).await;

    let count = notification::notify_late_loans(&deps, MESSAGE, today)
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        mocks.email.sent()[0].recipients,
        vec!["ciclano@email.com", "Fulano@email.com"]
    );
}

#[tokio::test]
async fn test_email_failure_is_reported_and_loans_untouched() {
    let (deps, mocks) = common::mock_dependencies();
    let today = date(2024, 3, 10);
    lend(&deps, "1", "a@email.com", date(2024, 3, 1)).await;
    mocks.email.fail_with_error();

    let result = notification::notify_late_loans(&deps, MESSAGE, today).await;

    assert!(matches!(result, Err(NotificationError::EmailService(_))));
    let late = loan::get_all_late_loans(&deps, today).await.unwrap();
    assert_eq!(late.len(), 1);
    assert!(!late[0].returned);
}

// ============================================================================
// スケジュール実行
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_notifier_fires_once_a_day() {
    let (deps, mocks) = common::mock_dependencies();
    // 実時間の今日から見て十分に古い貸出
    lend(&deps, "1", "a@email.com", date(2020, 1, 1)).await;

    let cancel = CancellationToken::new();
    let handle = notification::spawn_late_loan_notifier(
        deps,
        DailySchedule::midnight(),
        MESSAGE.to_string(),
        cancel.clone(),
    );

    // 初回の発火は24時間以内
    tokio::time::sleep(Duration::from_secs(24 * 60 * 60 + 1)).await;
    assert_eq!(mocks.email.sent().len(), 1);

    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
    assert_eq!(mocks.email.sent().len(), 2);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_notifier_stops_on_cancel() {
    let (deps, mocks) = common::mock_dependencies();
    lend(&deps, "1", "a@email.com", date(2020, 1, 1)).await;

    let cancel = CancellationToken::new();
    let handle = notification::spawn_late_loan_notifier(
        deps,
        DailySchedule::midnight(),
        MESSAGE.to_string(),
        cancel.clone(),
    );

    cancel.cancel();
    handle.await.unwrap();

    assert!(mocks.email.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_notifier_survives_email_failure() {
    let (deps, mocks) = common::mock_dependencies();
    lend(&deps, "1", "a@email.com", date(2020, 1, 1)).await;
    mocks.email.fail_with_error();

    let cancel = CancellationToken::new();
    let handle = notification::spawn_late_loan_notifier(
        deps,
        DailySchedule::midnight(),
        MESSAGE.to_string(),
        cancel.clone(),
    );

    tokio::time::sleep(Duration::from_secs(2 * 24 * 60 * 60)).await;
    assert!(!handle.is_finished());

    cancel.cancel();
    handle.await.unwrap();
}
