use crate::core::{Book, HistoryRecord, User};
use crate::facade::Library;
use std::io::{self, Write};

pub const MENU: &[&str] = &[
    "1. Add User",
    "2. View All Users",
    "3. Add Book",
    "4. View All Books",
    "5. Borrow Book",
    "6. Return Book",
    "7. View History",
    "8. Save",
    "9. Exit",
];

pub fn write_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Library System")?;
    for entry in MENU {
        writeln!(out, "{}", entry)?;
    }
    write!(out, "Select an option: ")?;
    out.flush()
}

pub fn book_line(book: &Book) -> String {
    let status = if book.is_available() { "Available" } else { "Not Available" };
    format!("{}. {} by {} - {}", book.id(), book.title(), book.author(), status)
}

pub fn user_line(user: &User) -> String {
    format!("{}. {}", user.id(), user.name())
}

/// History entry with book title and user name resolved where still known.
pub fn history_line(record: &HistoryRecord, library: &Library) -> String {
    let title = library.find_book(record.book_id()).map_or("<unknown book>", Book::title);
    let name = library.find_user(record.user_id()).map_or("<unknown user>", User::name);
    format!(
        "{} | {:<6} | book {} ({}) | user {} ({})",
        record.timestamp().format("%Y-%m-%d %H:%M:%S UTC"),
        record.action(),
        record.book_id(),
        title,
        record.user_id(),
        name
    )
}
