use super::ui;
use crate::config::LibraryConfig;
use crate::core::{BookId, LibraryError, UserId, require_non_empty};
use crate::facade::Library;
use crate::storage::{LibraryStore, LoadWarning};
use log::debug;
use std::io::{self, BufRead, Write};

/// A numbered entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddUser,
    ListUsers,
    AddBook,
    ListBooks,
    Borrow,
    Return,
    History,
    Save,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::AddUser),
            "2" => Some(Self::ListUsers),
            "3" => Some(Self::AddBook),
            "4" => Some(Self::ListBooks),
            "5" => Some(Self::Borrow),
            "6" => Some(Self::Return),
            "7" => Some(Self::History),
            "8" => Some(Self::Save),
            "9" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Interactive text shell over a [`Library`].
///
/// Reads menu selections and prompt answers line by line from `input` and
/// writes everything to `output`. Data and input errors are reported and the
/// loop continues; only the exit command or end of input stops it.
pub struct Shell<R, W> {
    library: Library,
    store: LibraryStore,
    save_on_exit: bool,
    unsaved_changes: bool,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(library: Library, store: LibraryStore, config: &LibraryConfig, input: R, output: W) -> Self {
        Self {
            library,
            store,
            save_on_exit: config.save_on_exit,
            unsaved_changes: false,
            input,
            output,
        }
    }

    /// Load the catalog named by `config` and build a shell around it.
    ///
    /// A load warning is shown to the user; the shell then starts empty. An
    /// empty or malformed file is moved aside first so a later save cannot
    /// overwrite it.
    pub fn open(config: &LibraryConfig, input: R, mut output: W) -> io::Result<Self> {
        let store = LibraryStore::new(&config.data_file);
        let outcome = store.load();
        if let Some(warning) = &outcome.warning {
            writeln!(output, "⚠️  Warning: {}. Starting with an empty catalog.", warning)?;
            if matches!(warning, LoadWarning::Empty { .. } | LoadWarning::Malformed { .. }) {
                match store.backup() {
                    Ok(backup) => writeln!(output, "Previous file kept as {}.", backup.display())?,
                    Err(e) => writeln!(output, "❌ {}", e)?,
                }
            }
        }
        let library = Library::from_snapshot(outcome.snapshot);
        Ok(Self::new(library, store, config, input, output))
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn into_parts(self) -> (Library, W) {
        (self.library, self.output)
    }

    /// Run the menu loop until exit or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            ui::write_menu(&mut self.output)?;

            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return self.exit();
            };

            match MenuChoice::parse(&line) {
                Some(MenuChoice::AddUser) => self.cmd_add_user()?,
                Some(MenuChoice::ListUsers) => self.cmd_list_users()?,
                Some(MenuChoice::AddBook) => self.cmd_add_book()?,
                Some(MenuChoice::ListBooks) => self.cmd_list_books()?,
                Some(MenuChoice::Borrow) => self.cmd_borrow()?,
                Some(MenuChoice::Return) => self.cmd_return()?,
                Some(MenuChoice::History) => self.cmd_history()?,
                Some(MenuChoice::Save) => self.cmd_save()?,
                Some(MenuChoice::Exit) => return self.exit(),
                None => writeln!(self.output, "❌ Invalid option. Try again.")?,
            }
        }
    }

    // Command handlers

    fn cmd_add_user(&mut self) -> io::Result<()> {
        let Some(name) = self.prompt("Enter user name: ")? else {
            return Ok(());
        };
        if let Err(e) = require_non_empty("Name", &name) {
            return writeln!(self.output, "❌ {}", e);
        }

        let message = match self.library.add_user(name) {
            Ok(user) => format!("✅ User added with ID {}.", user.id()),
            Err(e) => return writeln!(self.output, "❌ {}", e),
        };
        self.unsaved_changes = true;
        writeln!(self.output, "{}", message)
    }

    fn cmd_list_users(&mut self) -> io::Result<()> {
        if self.library.users().is_empty() {
            return writeln!(self.output, "No users registered.");
        }
        writeln!(self.output, "All Users:")?;
        for user in self.library.users() {
            writeln!(self.output, "{}", ui::user_line(user))?;
        }
        Ok(())
    }

    fn cmd_add_book(&mut self) -> io::Result<()> {
        let Some(title) = self.prompt("Enter book title: ")? else {
            return Ok(());
        };
        if let Err(e) = require_non_empty("Title", &title) {
            return writeln!(self.output, "❌ {}", e);
        }
        let Some(author) = self.prompt("Enter book author: ")? else {
            return Ok(());
        };
        if let Err(e) = require_non_empty("Author", &author) {
            return writeln!(self.output, "❌ {}", e);
        }

        let message = match self.library.add_book(title, author, true) {
            Ok(book) => format!("✅ Book added with ID {}.", book.id()),
            Err(e) => return writeln!(self.output, "❌ {}", e),
        };
        self.unsaved_changes = true;
        writeln!(self.output, "{}", message)
    }

    fn cmd_list_books(&mut self) -> io::Result<()> {
        if self.library.books().is_empty() {
            return writeln!(self.output, "No books in the catalog.");
        }
        writeln!(self.output, "All Books:")?;
        for book in self.library.books() {
            writeln!(self.output, "{}", ui::book_line(book))?;
        }
        Ok(())
    }

    fn cmd_borrow(&mut self) -> io::Result<()> {
        let Some((book_id, user_id)) = self.prompt_loan("borrow")? else {
            return Ok(());
        };
        let outcome = self.library.try_borrow_book(book_id, user_id).map(|_| ());
        self.report_loan(outcome, format!("✅ Book {} borrowed by user {}.", book_id, user_id))
    }

    fn cmd_return(&mut self) -> io::Result<()> {
        let Some((book_id, user_id)) = self.prompt_loan("return")? else {
            return Ok(());
        };
        let outcome = self.library.try_return_book(book_id, user_id).map(|_| ());
        self.report_loan(outcome, format!("✅ Book {} returned by user {}.", book_id, user_id))
    }

    fn cmd_history(&mut self) -> io::Result<()> {
        if self.library.history().is_empty() {
            return writeln!(self.output, "No history yet.");
        }
        writeln!(self.output, "History:")?;
        for record in self.library.history() {
            writeln!(self.output, "{}", ui::history_line(record, &self.library))?;
        }
        Ok(())
    }

    fn cmd_save(&mut self) -> io::Result<()> {
        match self.store.save(&self.library.snapshot()) {
            Ok(()) => {
                self.unsaved_changes = false;
                writeln!(self.output, "✅ Library saved to {}.", self.store.path().display())
            }
            Err(e) => writeln!(self.output, "❌ Save failed: {}", e),
        }
    }

    fn exit(&mut self) -> io::Result<()> {
        if self.unsaved_changes && self.save_on_exit {
            debug!("saving pending changes before exit");
            self.cmd_save()?;
        }
        writeln!(self.output, "👋 Goodbye!")?;
        self.output.flush()
    }

    // Input helpers

    /// One trimmed line from input; `None` at end of input.
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD instead of failing the read.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        self.read_line()
    }

    fn prompt_id(&mut self, label: &str) -> io::Result<Option<i64>> {
        let Some(raw) = self.prompt(label)? else {
            return Ok(None);
        };
        match raw.parse::<i64>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.output, "❌ Invalid ID.")?;
                Ok(None)
            }
        }
    }

    fn prompt_loan(&mut self, verb: &str) -> io::Result<Option<(BookId, UserId)>> {
        let Some(book_id) = self.prompt_id(&format!("Enter book ID to {}: ", verb))? else {
            return Ok(None);
        };
        let Some(user_id) = self.prompt_id("Enter user ID: ")? else {
            return Ok(None);
        };
        Ok(Some((book_id, user_id)))
    }

    fn report_loan(&mut self, outcome: Result<(), LibraryError>, success: String) -> io::Result<()> {
        match outcome {
            Ok(()) => {
                self.unsaved_changes = true;
                writeln!(self.output, "{}", success)
            }
            Err(e) => writeln!(self.output, "❌ {}", e),
        }
    }
}
