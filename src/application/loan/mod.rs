mod errors;
mod late_loans;
mod loan_service;

pub use errors::{LoanApplicationError, Result};
pub use late_loans::get_all_late_loans;
pub use loan_service::{
    find_loans, get_loan_by_id, get_loans_by_book, lend_book, return_book, save_loan, update_loan,
};
