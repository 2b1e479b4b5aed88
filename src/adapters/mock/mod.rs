pub mod book_repository;
pub mod email_service;
pub mod loan_repository;

pub use book_repository::BookRepository;
pub use email_service::{EmailService, SentMail};
pub use loan_repository::LoanRepository;
