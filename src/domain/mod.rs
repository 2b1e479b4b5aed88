pub mod book;
pub mod errors;
pub mod loan;
pub mod value_objects;

pub use book::Book;
pub use errors::*;
pub use loan::{Loan, LoanFilter};
pub use value_objects::*;
