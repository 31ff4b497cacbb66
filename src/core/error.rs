use thiserror::Error;

use super::types::{BookId, UserId};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Book {0} is already borrowed")]
    BookUnavailable(BookId),

    #[error("Book {0} is not borrowed")]
    BookNotBorrowed(BookId),

    #[error("No {0} ids left to assign")]
    IdsExhausted(&'static str),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LibraryError {
    /// True for the borrow/return rejections of the availability state machine
    /// (unknown book or user, book in the wrong state).
    pub fn is_loan_rejection(&self) -> bool {
        matches!(
            self,
            Self::BookNotFound(_)
                | Self::UserNotFound(_)
                | Self::BookUnavailable(_)
                | Self::BookNotBorrowed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

/// Rejects blank free-text input such as titles, authors and user names.
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_rejections() {
        assert!(LibraryError::BookNotFound(1).is_loan_rejection());
        assert!(LibraryError::UserNotFound(1).is_loan_rejection());
        assert!(LibraryError::BookUnavailable(1).is_loan_rejection());
        assert!(LibraryError::BookNotBorrowed(1).is_loan_rejection());
        assert!(!LibraryError::Persistence("disk full".into()).is_loan_rejection());
        assert!(!LibraryError::Validation("empty".into()).is_loan_rejection());
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("Title", "Dune").is_ok());
        assert!(require_non_empty("Title", "").is_err());

        let err = require_non_empty("Author", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Author cannot be empty");
    }
}
