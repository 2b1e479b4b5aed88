use crate::ports::*;
use std::sync::Arc;

/// サービスの依存関係
///
/// データ構造として定義し、振る舞いは持たない。
/// 各アプリケーション関数はこの構造体を引数として受け取る。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_repository: Arc<dyn BookRepository>,
    pub loan_repository: Arc<dyn LoanRepository>,
    pub email_service: Arc<dyn EmailService>,
    /// 貸出日からこの日数を超えて未返却なら延滞
    pub late_after_days: i64,
}
