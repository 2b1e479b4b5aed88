use crate::application::ServiceDependencies;
use crate::domain::{self, Loan};
use chrono::NaiveDate;

use super::errors::{LoanApplicationError, Result};

/// 延滞中の貸出をすべて取得する
///
/// ビジネスルール：
/// - 未返却であること
/// - 貸出日が「today - late_after_days」より前であること
///
/// 延滞は保存された状態ではなく、貸出日・返却フラグ・基準日から導出される。
/// リポジトリの候補はドメインの判定関数で再確認する。
pub async fn get_all_late_loans(deps: &ServiceDependencies, today: NaiveDate) -> Result<Vec<Loan>> {
    let threshold = domain::loan::late_threshold(today, deps.late_after_days);

    let candidates = deps
        .loan_repository
        .find_late(threshold)
        .await
        .map_err(LoanApplicationError::LoanRepositoryError)?;

    Ok(candidates
        .into_iter()
        .filter(|loan| domain::loan::is_late(loan, today, deps.late_after_days))
        .collect())
}
