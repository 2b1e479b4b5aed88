use crate::domain::{BookId, Loan, LoanFilter, LoanId, Page, PageRequest};
use crate::ports::book_repository::BookRepository as BookRepositoryTrait;
use crate::ports::loan_repository::{LoanRepository as LoanRepositoryTrait, OpenLoanConflict, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of LoanRepository
///
/// Filtering by isbn needs the book, so lookups go through the
/// book repository the loans were created against.
pub struct LoanRepository {
    books: Arc<dyn BookRepositoryTrait>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    loans: BTreeMap<LoanId, Loan>,
}

impl State {
    fn has_open_loan(&self, book_id: BookId, except: Option<LoanId>) -> bool {
        self.loans
            .values()
            .any(|l| l.book_id == book_id && !l.returned && l.id != except)
    }
}

impl LoanRepository {
    pub fn new(books: Arc<dyn BookRepositoryTrait>) -> Self {
        Self {
            books,
            state: Mutex::new(State {
                next_id: 1,
                loans: BTreeMap::new(),
            }),
        }
    }

    /// Snapshot of all stored loans ordered by id
    fn all(&self) -> Vec<Loan> {
        self.state.lock().unwrap().loans.values().cloned().collect()
    }
}

fn paginate(matches: Vec<Loan>, page: PageRequest) -> Page<Loan> {
    let total = matches.len() as u64;
    let content = matches
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.size() as usize)
        .collect();
    Page::new(content, page, total)
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn save(&self, loan: &Loan) -> Result<Loan> {
        let mut state = self.state.lock().unwrap();
        if !loan.returned && state.has_open_loan(loan.book_id, None) {
            return Err(Box::new(OpenLoanConflict {
                book_id: loan.book_id,
            }));
        }

        let id = LoanId::from_i64(state.next_id);
        state.next_id += 1;

        let saved = loan.clone().with_id(id);
        state.loans.insert(id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>> {
        Ok(self.state.lock().unwrap().loans.get(&id).cloned())
    }

    async fn update(&self, id: LoanId, loan: &Loan) -> Result<Option<Loan>> {
        let mut state = self.state.lock().unwrap();
        if !state.loans.contains_key(&id) {
            return Ok(None);
        }
        if !loan.returned && state.has_open_loan(loan.book_id, Some(id)) {
            return Err(Box::new(OpenLoanConflict {
                book_id: loan.book_id,
            }));
        }

        let updated = loan.clone().with_id(id);
        state.loans.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn find_by_filter(&self, filter: &LoanFilter, page: PageRequest) -> Result<Page<Loan>> {
        let mut matches = Vec::new();
        for loan in self.all() {
            // Loans whose book is gone never match, like the inner join does
            let Some(book) = self.books.find_by_id(loan.book_id).await? else {
                continue;
            };
            if filter.matches(&book.isbn, &loan.customer) {
                matches.push(loan);
            }
        }
        Ok(paginate(matches, page))
    }

    async fn find_by_book(&self, book_id: BookId, page: PageRequest) -> Result<Page<Loan>> {
        let matches = self
            .all()
            .into_iter()
            .filter(|l| l.book_id == book_id)
            .collect();
        Ok(paginate(matches, page))
    }

    async fn find_late(&self, threshold: NaiveDate) -> Result<Vec<Loan>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|l| !l.returned && l.loan_date < threshold)
            .collect())
    }

    async fn exists_open_loan_for_book(&self, book_id: BookId) -> Result<bool> {
        Ok(self.state.lock().unwrap().has_open_loan(book_id, None))
    }
}
