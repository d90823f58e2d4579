//! Generic list record model.
//!
//! # Responsibility
//! - Define the record shape shared by bills, treaties, members and articles.
//! - Provide composite identity construction from natural fields.
//!
//! # Invariants
//! - `identity` is stable across repeated fetches of the same logical record.
//! - `identity` is never empty for a valid record.
//! - Distinct composite part lists never produce the same identity.
//! - `payload` is opaque to aggregation and shuffle logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const IDENTITY_SEPARATOR: &str = ":";
const IDENTITY_ESCAPE: char = '\\';

/// Stable dedup key for one logical record.
///
/// Either a server-assigned id or a composite of natural fields such as
/// `congress:type:number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemIdentity(String);

impl ItemIdentity {
    /// Wraps one server-assigned identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// Builds a composite identity from natural key parts joined by `:`.
    ///
    /// Backslashes and `:` inside a part are backslash-escaped.
    pub fn composite<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = parts
            .into_iter()
            .map(|part| escape_part(part.as_ref().trim()))
            .collect::<Vec<_>>()
            .join(IDENTITY_SEPARATOR);
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn escape_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for ch in part.chars() {
        if ch == IDENTITY_ESCAPE || IDENTITY_SEPARATOR.starts_with(ch) {
            escaped.push(IDENTITY_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

impl Display for ItemIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that exposes a display title the shuffle engine can key on.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for String {
    fn title(&self) -> &str {
        self.as_str()
    }
}

impl Titled for &str {
    fn title(&self) -> &str {
        self
    }
}

/// Validation errors for list records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItemValidationError {
    EmptyIdentity,
}

impl Display for ListItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentity => write!(f, "list item identity cannot be empty"),
        }
    }
}

impl Error for ListItemValidationError {}

/// One paged record: bill, treaty, member or article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Dedup key; unique within one aggregated collection.
    pub identity: ItemIdentity,
    /// Display title, empty when the source record has none.
    pub title: String,
    /// Raw domain record as returned by the server.
    pub payload: Value,
}

impl ListItem {
    pub fn new(identity: ItemIdentity, title: impl Into<String>) -> Self {
        Self {
            identity,
            title: title.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn validate(&self) -> Result<(), ListItemValidationError> {
        if self.identity.is_empty() {
            return Err(ListItemValidationError::EmptyIdentity);
        }
        Ok(())
    }
}

impl Titled for ListItem {
    fn title(&self) -> &str {
        &self.title
    }
}
