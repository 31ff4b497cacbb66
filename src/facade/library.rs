use crate::core::{
    Book, BookId, HistoryAction, HistoryRecord, LibraryError, Result, User, UserId,
};
use crate::storage::LibrarySnapshot;
use log::debug;

/// The catalog aggregate: books, borrowers and the borrow/return history.
///
/// Owns all three collections and the id counters. Collections are only
/// exposed as shared slices, so callers cannot bypass the availability
/// state machine.
///
/// # Examples
///
/// ```
/// use library_catalog::Library;
///
/// # fn main() -> library_catalog::Result<()> {
/// let mut library = Library::new();
/// let book_id = library.add_book("Dune", "Herbert", true)?.id();
/// let user_id = library.add_user("Alice")?.id();
///
/// assert!(library.borrow_book(book_id, user_id));
/// assert!(!library.borrow_book(book_id, user_id));
/// assert!(library.return_book(book_id, user_id));
/// assert_eq!(library.history().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Library {
    books: Vec<Book>,
    users: Vec<User>,
    history: Vec<HistoryRecord>,
    /// `None` once the id space is used up.
    next_book_id: Option<BookId>,
    next_user_id: Option<UserId>,
}

impl Library {
    pub fn new() -> Self {
        Self {
            books: Vec::new(),
            users: Vec::new(),
            history: Vec::new(),
            next_book_id: Some(1),
            next_user_id: Some(1),
        }
    }

    /// Rebuild the aggregate from persisted state.
    ///
    /// Counters restart at one past the highest stored id so restored ids are
    /// never handed out again. When the highest stored id is `i64::MAX` the
    /// catalog still loads, but adding to that collection fails.
    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Self {
        let LibrarySnapshot { books, users, history } = snapshot;
        let next_book_id = next_after(books.iter().map(Book::id).max());
        let next_user_id = next_after(users.iter().map(User::id).max());

        debug!(
            "restored library: books={} users={} history={} next_book_id={:?} next_user_id={:?}",
            books.len(),
            users.len(),
            history.len(),
            next_book_id,
            next_user_id
        );

        Self {
            books,
            users,
            history,
            next_book_id,
            next_user_id,
        }
    }

    /// Copy of the full state, as written by the store.
    pub fn snapshot(&self) -> LibrarySnapshot {
        LibrarySnapshot {
            books: self.books.clone(),
            users: self.users.clone(),
            history: self.history.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Books and users
    // ------------------------------------------------------------------

    /// Fails only with [`LibraryError::IdsExhausted`].
    pub fn add_book(&mut self, title: impl Into<String>, author: impl Into<String>, available: bool) -> Result<&Book> {
        let id = self.next_book_id.ok_or(LibraryError::IdsExhausted("book"))?;
        self.next_book_id = id.checked_add(1);

        let mut book = Book::new(id, title, author);
        if !available {
            book.mark_borrowed();
        }
        debug!("added book id={} title='{}' available={}", id, book.title(), available);

        let index = self.books.len();
        self.books.push(book);
        Ok(&self.books[index])
    }

    /// Fails only with [`LibraryError::IdsExhausted`].
    pub fn add_user(&mut self, name: impl Into<String>) -> Result<&User> {
        let id = self.next_user_id.ok_or(LibraryError::IdsExhausted("user"))?;
        self.next_user_id = id.checked_add(1);

        let user = User::new(id, name);
        debug!("added user id={} name='{}'", id, user.name());

        let index = self.users.len();
        self.users.push(user);
        Ok(&self.users[index])
    }

    pub fn find_book(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|book| book.id() == id)
    }

    pub fn find_user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id() == id)
    }

    fn find_book_mut(&mut self, id: BookId) -> Option<&mut Book> {
        self.books.iter_mut().find(|book| book.id() == id)
    }

    // ------------------------------------------------------------------
    // Borrow / return
    // ------------------------------------------------------------------

    /// Borrow a book, reporting only success or failure.
    pub fn borrow_book(&mut self, book_id: BookId, user_id: UserId) -> bool {
        self.try_borrow_book(book_id, user_id).is_ok()
    }

    /// Return a book, reporting only success or failure.
    pub fn return_book(&mut self, book_id: BookId, user_id: UserId) -> bool {
        self.try_return_book(book_id, user_id).is_ok()
    }

    /// Borrow a book and return the appended history record.
    ///
    /// Fails without touching any state when the book or user is unknown, or
    /// when the book is already borrowed.
    pub fn try_borrow_book(&mut self, book_id: BookId, user_id: UserId) -> Result<&HistoryRecord> {
        self.transition(book_id, user_id, HistoryAction::Borrow)
    }

    /// Return a book and return the appended history record.
    ///
    /// Fails without touching any state when the book or user is unknown, or
    /// when the book is not currently borrowed.
    pub fn try_return_book(&mut self, book_id: BookId, user_id: UserId) -> Result<&HistoryRecord> {
        self.transition(book_id, user_id, HistoryAction::Return)
    }

    fn transition(&mut self, book_id: BookId, user_id: UserId, action: HistoryAction) -> Result<&HistoryRecord> {
        if let Err(err) = self.check_transition(book_id, user_id, action) {
            debug!("{} rejected: book={} user={} reason='{}'", action, book_id, user_id, err);
            return Err(err);
        }

        let book = self
            .find_book_mut(book_id)
            .ok_or(LibraryError::BookNotFound(book_id))?;
        match action {
            HistoryAction::Borrow => book.mark_borrowed(),
            HistoryAction::Return => book.mark_returned(),
        }

        let index = self.history.len();
        self.history.push(HistoryRecord::now(book_id, user_id, action));
        debug!("{} recorded: book={} user={}", action, book_id, user_id);
        Ok(&self.history[index])
    }

    fn check_transition(&self, book_id: BookId, user_id: UserId, action: HistoryAction) -> Result<()> {
        let book = self
            .find_book(book_id)
            .ok_or(LibraryError::BookNotFound(book_id))?;
        if self.find_user(user_id).is_none() {
            return Err(LibraryError::UserNotFound(user_id));
        }
        match (action, book.is_available()) {
            (HistoryAction::Borrow, false) => Err(LibraryError::BookUnavailable(book_id)),
            (HistoryAction::Return, true) => Err(LibraryError::BookNotBorrowed(book_id)),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Read views
    // ------------------------------------------------------------------

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn available_books(&self) -> impl Iterator<Item = &Book> {
        self.books.iter().filter(|book| book.is_available())
    }

    pub fn history_for_book(&self, book_id: BookId) -> impl Iterator<Item = &HistoryRecord> {
        self.history.iter().filter(move |record| record.book_id() == book_id)
    }

    pub fn history_for_user(&self, user_id: UserId) -> impl Iterator<Item = &HistoryRecord> {
        self.history.iter().filter(move |record| record.user_id() == user_id)
    }

    /// Id the next added book receives, `None` when no ids are left.
    pub fn next_book_id(&self) -> Option<BookId> {
        self.next_book_id
    }

    pub fn next_user_id(&self) -> Option<UserId> {
        self.next_user_id
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.users.is_empty() && self.history.is_empty()
    }
}

fn next_after(max: Option<i64>) -> Option<i64> {
    match max {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn library_with_alice_and_dune() -> Library {
        let mut library = Library::new();
        library.add_book("Dune", "Herbert", true).unwrap();
        library.add_user("Alice").unwrap();
        library
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut library = Library::new();
        let ids: Vec<BookId> = (0..5)
            .map(|i| library.add_book(format!("Book {}", i), "Anon", true).unwrap().id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        assert_eq!(library.add_user("Alice").unwrap().id(), 1);
        assert_eq!(library.add_user("Alice").unwrap().id(), 2);
        assert_eq!(library.users().len(), 2);
    }

    #[test]
    fn test_add_book_unavailable() {
        let mut library = Library::new();
        let book = library.add_book("Emma", "Austen", false).unwrap();
        assert!(!book.is_available());
        assert_eq!(library.available_books().count(), 0);
    }

    #[test]
    fn test_find() {
        let library = library_with_alice_and_dune();
        assert_eq!(library.find_book(1).map(Book::title), Some("Dune"));
        assert_eq!(library.find_user(1).map(User::name), Some("Alice"));
        assert!(library.find_book(2).is_none());
        assert!(library.find_user(0).is_none());
    }

    #[test]
    fn test_borrow_then_borrow_again() {
        let mut library = library_with_alice_and_dune();
        let before = Utc::now();

        assert!(library.borrow_book(1, 1));
        assert!(!library.find_book(1).unwrap().is_available());
        assert_eq!(library.history().len(), 1);

        let record = &library.history()[0];
        assert_eq!(record.book_id(), 1);
        assert_eq!(record.user_id(), 1);
        assert_eq!(record.action(), HistoryAction::Borrow);
        assert!(record.timestamp() >= before);

        assert!(!library.borrow_book(1, 1));
        assert_eq!(library.history().len(), 1);
    }

    #[test]
    fn test_return_never_borrowed_fails() {
        let mut library = library_with_alice_and_dune();
        assert!(!library.return_book(1, 1));
        assert!(library.history().is_empty());
        assert!(library.find_book(1).unwrap().is_available());
    }

    #[test]
    fn test_borrow_and_return_cycle() {
        let mut library = library_with_alice_and_dune();
        assert!(library.borrow_book(1, 1));
        assert!(library.return_book(1, 1));
        assert!(library.find_book(1).unwrap().is_available());

        let actions: Vec<HistoryAction> = library.history().iter().map(HistoryRecord::action).collect();
        assert_eq!(actions, vec![HistoryAction::Borrow, HistoryAction::Return]);
    }

    #[test]
    fn test_rejection_reasons() {
        let mut library = library_with_alice_and_dune();

        assert!(matches!(library.try_borrow_book(9, 1), Err(LibraryError::BookNotFound(9))));
        assert!(matches!(library.try_borrow_book(1, 9), Err(LibraryError::UserNotFound(9))));
        assert!(matches!(library.try_return_book(1, 1), Err(LibraryError::BookNotBorrowed(1))));

        library.try_borrow_book(1, 1).unwrap();
        assert!(matches!(library.try_borrow_book(1, 1), Err(LibraryError::BookUnavailable(1))));
        assert!(matches!(library.try_return_book(1, 9), Err(LibraryError::UserNotFound(9))));

        assert_eq!(library.history().len(), 1);
        assert!(!library.find_book(1).unwrap().is_available());
    }

    #[test]
    fn test_unknown_user_leaves_book_untouched() {
        let mut library = library_with_alice_and_dune();
        assert!(!library.borrow_book(1, 42));
        assert!(library.find_book(1).unwrap().is_available());
        assert!(library.history().is_empty());
    }

    #[test]
    fn test_history_filters() {
        let mut library = library_with_alice_and_dune();
        library.add_book("Emma", "Austen", true).unwrap();
        library.add_user("Bob").unwrap();

        library.try_borrow_book(1, 1).unwrap();
        library.try_borrow_book(2, 2).unwrap();
        library.try_return_book(1, 2).unwrap();

        assert_eq!(library.history_for_book(1).count(), 2);
        assert_eq!(library.history_for_book(2).count(), 1);
        assert_eq!(library.history_for_user(2).count(), 2);
        assert_eq!(library.history_for_user(3).count(), 0);
    }

    #[test]
    fn test_from_snapshot_recomputes_counters() {
        let snapshot = LibrarySnapshot {
            books: vec![Book::new(4, "A", "X"), Book::with_availability(9, "B", "Y", false)],
            users: vec![User::new(2, "Alice")],
            history: Vec::new(),
        };

        let mut library = Library::from_snapshot(snapshot);
        assert_eq!(library.next_book_id(), Some(10));
        assert_eq!(library.next_user_id(), Some(3));
        assert_eq!(library.add_book("C", "Z", true).unwrap().id(), 10);
        assert_eq!(library.add_user("Bob").unwrap().id(), 3);
    }

    #[test]
    fn test_from_empty_snapshot() {
        let library = Library::from_snapshot(LibrarySnapshot::default());
        assert!(library.is_empty());
        assert_eq!(library.next_book_id(), Some(1));
        assert_eq!(library.next_user_id(), Some(1));
    }

    #[test]
    fn test_max_id_in_snapshot_exhausts_counter() {
        let snapshot = LibrarySnapshot {
            books: vec![Book::with_availability(i64::MAX, "Dune", "Herbert", false)],
            users: vec![User::new(1, "Alice")],
            history: Vec::new(),
        };

        let mut library = Library::from_snapshot(snapshot);
        assert_eq!(library.next_book_id(), None);
        assert!(matches!(
            library.add_book("Emma", "Austen", true),
            Err(LibraryError::IdsExhausted("book"))
        ));
        assert_eq!(library.books().len(), 1);

        // Users and loans are unaffected
        assert_eq!(library.add_user("Bob").unwrap().id(), 2);
        assert!(library.return_book(i64::MAX, 2));
    }

    #[test]
    fn test_last_id_is_assigned_once() {
        let snapshot = LibrarySnapshot {
            users: vec![User::new(i64::MAX - 1, "Alice")],
            ..LibrarySnapshot::default()
        };

        let mut library = Library::from_snapshot(snapshot);
        assert_eq!(library.add_user("Bob").unwrap().id(), i64::MAX);
        assert_eq!(library.next_user_id(), None);
        assert!(library.add_user("Carol").is_err());
        assert_eq!(library.users().len(), 2);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut library = library_with_alice_and_dune();
        library.add_book("Emma", "Austen", false).unwrap();
        library.try_borrow_book(1, 1).unwrap();

        let snapshot = library.snapshot();
        assert_eq!(snapshot.books, library.books());
        assert_eq!(snapshot.users, library.users());
        assert_eq!(snapshot.history, library.history());
    }
}
