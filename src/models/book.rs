//! Book records and the raw catalog documents they are shaped from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Catalog identifier, kept exactly as scanned.
///
/// Accepts either a JSON string or an integer on input and always
/// serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub struct Isbn(String);

impl Isbn {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Isbn {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Isbn {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Str(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
            StringOrNumber::Float(n) => n.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for Isbn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        StringOrNumber::deserialize(deserializer).map(|v| Isbn(v.into()))
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

/// One document of a catalog search response.
///
/// The catalog returns `isbn` as a list of every edition's identifiers, so it
/// is never read from the payload; the scanned value is attached instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CatalogDoc {
    #[serde(default, skip_deserializing)]
    pub isbn: Option<Isbn>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub first_publish_date: Option<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    /// Carried over when a stored record is reshaped
    #[serde(default, rename = "dateAdded")]
    pub date_added: Option<DateTime<Utc>>,
}

impl CatalogDoc {
    pub fn with_isbn(mut self, isbn: Isbn) -> Self {
        self.isbn = Some(isbn);
        self
    }
}

/// Catalog search response envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSearchResponse {
    #[serde(default, rename = "numFound")]
    pub num_found: Option<u64>,
    #[serde(default)]
    pub docs: Vec<CatalogDoc>,
}

/// Normalized inventory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookRecord {
    pub isbn: Isbn,
    pub title: String,
    /// Author names joined with `,`
    pub authors: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub first_publish_date: Option<String>,
    pub count: u32,
    #[serde(rename = "dateAdded")]
    pub date_added: DateTime<Utc>,
    #[serde(rename = "dateModified")]
    pub date_modified: DateTime<Utc>,
}

/// Shape a catalog document into a fresh record with `count = 1`.
pub fn parse_book(doc: CatalogDoc) -> AppResult<BookRecord> {
    parse_book_at(doc, Utc::now())
}

pub(crate) fn parse_book_at(doc: CatalogDoc, now: DateTime<Utc>) -> AppResult<BookRecord> {
    let isbn = doc
        .isbn
        .ok_or_else(|| AppError::Validation("catalog document has no isbn".to_string()))?;
    let authors = doc
        .author_name
        .ok_or_else(|| AppError::Validation(format!("catalog document for {} has no author_name", isbn)))?
        .join(",");

    let first_publish_date = doc
        .first_publish_date
        .or_else(|| doc.first_publish_year.map(|year| year.to_string()));

    Ok(BookRecord {
        isbn,
        title: doc.title,
        authors,
        first_publish_date,
        count: 1,
        date_added: doc.date_added.unwrap_or(now),
        date_modified: now,
    })
}
