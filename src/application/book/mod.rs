mod book_service;
mod errors;

pub use book_service::{delete_book, get_book_by_id, get_book_by_isbn, save_book, update_book};
pub use errors::{BookApplicationError, Result};
