use crate::application::loan::LoanApplicationError;
use thiserror::Error;

/// 延滞通知のエラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// 延滞貸出の取得に失敗
    #[error("Failed to collect late loans")]
    LoanService(#[from] LoanApplicationError),

    /// EmailServiceのエラー
    #[error("Email service error")]
    EmailService(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, NotificationError>;
