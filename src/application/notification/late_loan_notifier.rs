use crate::application::{ServiceDependencies, loan::get_all_late_loans};
use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::errors::{NotificationError, Result};

/// 延滞中の貸出の顧客へメールを送る
///
/// 処理フロー：
/// 1. 延滞中の貸出を取得
/// 2. 顧客メールアドレスへ射影（大文字小文字を区別せず重複除去、順序は安定）
/// 3. 宛先があれば EmailService を1回だけ呼ぶ。宛先がなければ何もしない
///
/// 貸出の状態は変更しない。失敗しても同じ実行内では再送しない。
///
/// # 戻り値
/// 送信した宛先の数
pub async fn notify_late_loans(
    deps: &ServiceDependencies,
    message: &str,
    today: NaiveDate,
) -> Result<usize> {
    let late_loans = get_all_late_loans(deps, today).await?;

    // 大文字小文字違いは同じ宛先とみなし、最初に現れた表記を使う
    let mut unique: BTreeMap<String, String> = BTreeMap::new();
    for loan in late_loans {
        unique
            .entry(loan.customer_email.to_lowercase())
            .or_insert(loan.customer_email);
    }
    let recipients: Vec<String> = unique.into_values().collect();

    if recipients.is_empty() {
        tracing::debug!("no late loans, skipping notification");
        return Ok(0);
    }

    deps.email_service
        .send_mails(message, &recipients)
        .await
        .map_err(NotificationError::EmailService)?;

    Ok(recipients.len())
}
