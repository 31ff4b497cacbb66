pub mod error;
pub mod types;

pub use error::{LibraryError, Result, require_non_empty};
pub use types::{Book, BookId, HistoryAction, HistoryRecord, User, UserId};
