//! Member contact directory loaded from CSV.
//!
//! # Responsibility
//! - Parse RFC 4180-style CSV text.
//! - Build a member id -> contact email lookup from a headed CSV table.
//! - Publish the lookup into an injected `CacheStore`.
//!
//! # Invariants
//! - The first non-blank row is the header; `id` and `email` are required.
//! - The first row for a given id wins; later duplicates are ignored.
//! - Email addresses are never logged.

use crate::cache::{CacheResult, CacheStore};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_NAMESPACE: &str = "contact";

pub type ContactsResult<T> = Result<T, ContactsError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactsError {
    /// A quoted field opened on `line` (1-based) never closed.
    UnterminatedQuote { line: usize },
    MissingHeader,
    MissingColumn(&'static str),
}

impl Display for ContactsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedQuote { line } => {
                write!(f, "unterminated quoted field starting on line {line}")
            }
            Self::MissingHeader => write!(f, "csv input has no header row"),
            Self::MissingColumn(column) => write!(f, "csv header is missing `{column}` column"),
        }
    }
}

impl Error for ContactsError {}

/// Parses CSV text into rows of fields.
///
/// Supports quoted fields with `""` escapes, embedded commas and newlines,
/// and LF or CRLF row endings. Blank lines are skipped.
pub fn parse_csv(text: &str) -> ContactsResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut row_quoted = false;
    let mut quote_line = 0;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => {
                in_quotes = true;
                row_quoted = true;
                quote_line = line;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                row.push(std::mem::take(&mut field));
                push_row(&mut rows, std::mem::take(&mut row), row_quoted);
                row_quoted = false;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(ContactsError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !row.is_empty() || row_quoted {
        row.push(field);
        push_row(&mut rows, row, row_quoted);
    }

    Ok(rows)
}

/// Drops blank lines; a lone `""` field is a row, not a blank line.
fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>, quoted: bool) {
    let is_blank = !quoted && row.len() == 1 && row[0].is_empty();
    if !is_blank {
        rows.push(row);
    }
}

/// Cache key under which one member's contact email is stored.
pub fn contact_key(member_id: &str) -> String {
    format!("{CONTACT_NAMESPACE}:{}", member_id.trim())
}

/// Member id -> contact email lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDirectory {
    emails: BTreeMap<String, String>,
}

impl ContactDirectory {
    /// Builds a directory from headed CSV text.
    ///
    /// Rows with a blank id or email are skipped.
    pub fn from_csv(text: &str) -> ContactsResult<Self> {
        let rows = parse_csv(text)?;
        let mut rows = rows.into_iter();
        let header = rows.next().ok_or(ContactsError::MissingHeader)?;
        let id_column = find_column(&header, "id")?;
        let email_column = find_column(&header, "email")?;

        let mut emails = BTreeMap::new();
        let mut skipped = 0usize;
        let mut duplicates = 0usize;
        for row in rows {
            let id = row.get(id_column).map_or("", |value| value.trim());
            let email = row.get(email_column).map_or("", |value| value.trim());
            if id.is_empty() || email.is_empty() {
                skipped += 1;
                continue;
            }
            if emails.contains_key(id) {
                duplicates += 1;
                continue;
            }
            emails.insert(id.to_string(), email.to_string());
        }

        if skipped > 0 || duplicates > 0 {
            warn!(
                "event=contacts_load module=contacts status=partial loaded={} skipped={} duplicates={}",
                emails.len(),
                skipped,
                duplicates
            );
        }

        Ok(Self { emails })
    }

    pub fn lookup(&self, member_id: &str) -> Option<&str> {
        self.emails.get(member_id.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Writes every entry into `store` under `contact:<id>` keys.
    pub fn load_into<S: CacheStore + ?Sized>(&self, store: &S) -> CacheResult<usize> {
        for (id, email) in &self.emails {
            store.put(&contact_key(id), email)?;
        }
        info!(
            "event=contacts_publish module=contacts status=ok count={}",
            self.emails.len()
        );
        Ok(self.emails.len())
    }
}

fn find_column(header: &[String], name: &'static str) -> ContactsResult<usize> {
    header
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case(name))
        .ok_or(ContactsError::MissingColumn(name))
}
