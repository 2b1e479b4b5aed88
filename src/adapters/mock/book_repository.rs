use crate::domain::{Book, BookId};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, IsbnConflict, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory implementation of BookRepository
///
/// Assigns sequential ids and enforces the isbn unique constraint
/// the same way the database does.
pub struct BookRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    books: BTreeMap<BookId, Book>,
}

impl State {
    fn isbn_taken(&self, isbn: &str, except: Option<BookId>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && b.id != except)
    }
}

impl BookRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                books: BTreeMap::new(),
            }),
        }
    }

    /// Number of stored books
    pub fn count(&self) -> usize {
        self.state.lock().unwrap().books.len()
    }
}

impl Default for BookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().isbn_taken(isbn, None))
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let state = self.state.lock().unwrap();
        Ok(state.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn save(&self, book: &Book) -> Result<Book> {
        let mut state = self.state.lock().unwrap();
        if state.isbn_taken(&book.isbn, None) {
            return Err(Box::new(IsbnConflict {
                isbn: book.isbn.clone(),
            }));
        }

        let id = BookId::from_i64(state.next_id);
        state.next_id += 1;

        let saved = book.clone().with_id(id);
        state.books.insert(id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.state.lock().unwrap().books.get(&id).cloned())
    }

    async fn update(&self, id: BookId, book: &Book) -> Result<Option<Book>> {
        let mut state = self.state.lock().unwrap();
        if !state.books.contains_key(&id) {
            return Ok(None);
        }
        if state.isbn_taken(&book.isbn, Some(id)) {
            return Err(Box::new(IsbnConflict {
                isbn: book.isbn.clone(),
            }));
        }

        let updated = book.clone().with_id(id);
        state.books.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: BookId) -> Result<()> {
        self.state.lock().unwrap().books.remove(&id);
        Ok(())
    }
}
