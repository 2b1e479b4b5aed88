pub mod email_service;

pub use email_service::EmailService as SmtpEmailService;
