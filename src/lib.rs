// ============================================================================
// Library Catalog
// ============================================================================

//! Single-user library catalog: books, borrowers and a chronological
//! borrow/return history, persisted as one JSON document.
//!
//! # Examples
//!
//! ```no_run
//! use library_catalog::{Library, LibraryStore};
//!
//! # fn main() -> library_catalog::Result<()> {
//! let store = LibraryStore::new("library.json");
//! let mut library = Library::from_snapshot(store.load().snapshot);
//!
//! let book = library.add_book("Dune", "Herbert", true)?.id();
//! let user = library.add_user("Alice")?.id();
//! library.try_borrow_book(book, user)?;
//!
//! store.save(&library.snapshot())?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod facade;
pub mod storage;

// Re-export main types for convenience
pub use config::LibraryConfig;
pub use core::{Book, BookId, HistoryAction, HistoryRecord, LibraryError, Result, User, UserId};
pub use facade::Library;
pub use storage::{LibrarySnapshot, LibraryStore, LoadOutcome, LoadWarning};
