use lettre::Address;
use std::borrow::Cow;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// 項目単位のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// リクエストを検証し、違反を項目エラーの一覧として返す
///
/// ハンドラーはサービスを呼ぶ前にこの関数を呼ぶ。
/// 一覧は項目名、メッセージの順に並べる。
pub fn validate_request<T: Validate>(request: &T) -> Result<(), Vec<FieldError>> {
    let Err(errors) = request.validate() else {
        return Ok(());
    };

    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();

    field_errors.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    Err(field_errors)
}

/// メールアドレスの検証
///
/// 送信時と同じくlettreで解釈できるアドレスだけを受け付ける。
pub fn validate_mail_address(value: &str) -> Result<(), ValidationError> {
    if Address::from_str(value).is_ok() {
        return Ok(());
    }

    let mut error = ValidationError::new("email");
    error.message = Some(Cow::from("must be a well-formed email address"));
    Err(error)
}
