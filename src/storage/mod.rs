pub mod persistence;

pub use persistence::{LibrarySnapshot, LibraryStore, LoadOutcome, LoadWarning};
