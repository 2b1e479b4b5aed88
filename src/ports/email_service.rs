use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// メール送信ポート
///
/// 配信メカニズム（SMTPなど）を抽象化する。
#[async_trait]
pub trait EmailService: Send + Sync {
    /// 同一メッセージを宛先リストへ送信する
    ///
    /// 1回の呼び出しで全宛先に送る。
    async fn send_mails(&self, message: &str, recipients: &[String]) -> Result<()>;
}
