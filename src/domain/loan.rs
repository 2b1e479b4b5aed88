use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, ReturnLoanError};

/// 延滞とみなすまでの日数（既定値）
pub const DEFAULT_LATE_AFTER_DAYS: i64 = 4;

/// 設定で受け付ける日数の上限（約100年）
pub const MAX_LATE_AFTER_DAYS: i64 = 36_500;

/// Loan エンティティ - 1冊の書籍の1回の貸出
///
/// 書籍は book_id（外部キー）でのみ参照する。書籍の詳細が必要な場合は
/// 呼び出し側がリポジトリ経由で明示的に取得する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Option<LoanId>,
    pub book_id: BookId,
    pub customer: String,
    pub customer_email: String,
    pub loan_date: NaiveDate,
    /// false = 貸出中
    pub returned: bool,
}

impl Loan {
    /// 未保存の貸出を作成する（貸出中）
    pub fn new(
        book_id: BookId,
        customer: impl Into<String>,
        customer_email: impl Into<String>,
        loan_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            book_id,
            customer: customer.into(),
            customer_email: customer_email.into(),
            loan_date,
            returned: false,
        }
    }

    pub fn with_id(self, id: LoanId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}

/// 貸出検索条件
///
/// すべて任意。指定された項目はすべて一致する必要がある（AND）。
/// 空文字・空白のみの値は未指定として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

impl LoanFilter {
    pub fn isbn(&self) -> Option<&str> {
        non_blank(self.isbn.as_deref())
    }

    pub fn customer(&self) -> Option<&str> {
        non_blank(self.customer.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.isbn().is_none() && self.customer().is_none()
    }

    /// 書籍のISBNと貸出の顧客名が条件に一致するか
    ///
    /// 比較は大文字小文字を区別しない完全一致。
    pub fn matches(&self, isbn: &str, customer: &str) -> bool {
        let isbn_ok = self.isbn().is_none_or(|wanted| eq_ignore_case(wanted, isbn));
        let customer_ok = self
            .customer()
            .is_none_or(|wanted| eq_ignore_case(wanted, customer));
        isbn_ok && customer_ok
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}

/// 純粋関数：延滞判定の基準日
///
/// この日付より前に貸し出された未返却の貸出が延滞となる。
///
/// 日付の範囲を超える場合は表現できる端の日付に丸める（パニックしない）。
pub fn late_threshold(today: NaiveDate, late_after_days: i64) -> NaiveDate {
    let days = Days::new(late_after_days.unsigned_abs());
    if late_after_days >= 0 {
        today.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
    } else {
        today.checked_add_days(days).unwrap_or(NaiveDate::MAX)
    }
}

/// 純粋関数：延滞判定
///
/// ビジネスルール：
/// - 返却済みは延滞ではない（日付に関係なく）
/// - 貸出日が「今日 - 貸出期間」より厳密に前なら延滞
pub fn is_late(loan: &Loan, today: NaiveDate, late_after_days: i64) -> bool {
    !loan.returned && loan.loan_date < late_threshold(today, late_after_days)
}

/// 純粋関数：書籍を返却する
///
/// 副作用なし。返却済みにした新しいLoanを返す。
pub fn return_loan(loan: &Loan) -> Result<Loan, ReturnLoanError> {
    if loan.returned {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(Loan {
        returned: true,
        ..loan.clone()
    })
}
