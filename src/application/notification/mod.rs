mod errors;
mod late_loan_notifier;
mod schedule;

pub use errors::{NotificationError, Result};
pub use late_loan_notifier::notify_late_loans;
pub use schedule::{DailySchedule, spawn_late_loan_notifier};
