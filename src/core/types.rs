use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type BookId = i64;
pub type UserId = i64;

/// A catalogued book.
///
/// Identity and bibliographic fields are fixed at construction; availability
/// is the only state that changes, and only through [`Book::mark_borrowed`]
/// and [`Book::mark_returned`].
///
/// PascalCase keys (`Id`, `Title`, ...) are accepted on read so book lists
/// written by the older desktop program still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(alias = "Id")]
    id: BookId,
    #[serde(alias = "Title")]
    title: String,
    #[serde(alias = "Author")]
    author: String,
    #[serde(rename = "isAvailable", alias = "IsAvailable", default = "default_available")]
    available: bool,
}

fn default_available() -> bool {
    true
}

impl Book {
    pub fn new(id: BookId, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self::with_availability(id, title, author, true)
    }

    /// Used when restoring a book whose availability was recorded earlier.
    pub fn with_availability(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        available: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            available,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Available -> Borrowed. No-op when already borrowed.
    pub fn mark_borrowed(&mut self) {
        if self.available {
            self.available = false;
        }
    }

    /// Borrowed -> Available. No-op when already available.
    pub fn mark_returned(&mut self) {
        if !self.available {
            self.available = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Borrow,
    Return,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryAction::Borrow => f.pad("Borrow"),
            HistoryAction::Return => f.pad("Return"),
        }
    }
}

/// One entry of the append-only borrow/return log.
///
/// `book_id` and `user_id` are plain references; they were valid when the
/// record was created and are not re-checked afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    book_id: BookId,
    user_id: UserId,
    action: HistoryAction,
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(
        book_id: BookId,
        user_id: UserId,
        action: HistoryAction,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            book_id,
            user_id,
            action,
            timestamp,
        }
    }

    /// Record stamped with the current time.
    pub fn now(book_id: BookId, user_id: UserId, action: HistoryAction) -> Self {
        Self::new(book_id, user_id, action, Utc::now())
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn action(&self) -> HistoryAction {
        self.action
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Timestamps are written as RFC 3339. Reading also accepts ISO-8601
/// datetimes without an offset, which are taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
