//! Explicit filter, sort and page specification handed to a [`BookStore`].
//!
//! Handlers never talk SQL. They compose a [`QuerySpec`] and each backend
//! decides how to run it.
//!
//! [`BookStore`]: crate::models::storage::BookStore

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Title,
    Author,
    Publisher,
    Year,
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Title => "title",
            Field::Author => "author",
            Field::Publisher => "publisher",
            Field::Year => "year",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Id | Field::Year)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    /// Raw query parameters are passed through untouched unless they read as an integer.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(number) => Value::Integer(number),
            Err(_) => Value::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(number) => write!(f, "{}", number),
            Value::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Equals { field: Field, value: Value },
    /// Inclusive on both ends.
    Between { field: Field, start: Value, end: Value },
    /// Case-insensitive substring match.
    Contains { field: Field, needle: String },
    And { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn equals(field: Field, value: Value) -> Self {
        Predicate::Equals { field, value }
    }

    pub fn between(field: Field, start: Value, end: Value) -> Self {
        Predicate::Between { field, start, end }
    }

    pub fn contains(field: Field, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            field,
            needle: needle.into(),
        }
    }

    /// Conjunction that flattens nested `And`s so the spec stays one level deep.
    pub fn and(self, other: Predicate) -> Self {
        let mut predicates = match self {
            Predicate::And { predicates } => predicates,
            single => vec![single],
        };
        match other {
            Predicate::And { predicates: rest } => predicates.extend(rest),
            single => predicates.push(single),
        }
        Predicate::And { predicates }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const ALLOWED: [&'static str; 2] = ["asc", "desc"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: Field,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub per_page: u32,
    pub page: u32,
}

impl PageSpec {
    pub const DEFAULT_PER_PAGE: u32 = 5;
    pub const MAX_PER_PAGE: u32 = 10;

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            per_page: Self::DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub filter: Option<Predicate>,
    pub sort: Option<SortSpec>,
    pub page: Option<PageSpec>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn sort_by(mut self, field: Field, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec { field, direction });
        self
    }

    pub fn paginate(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }
}
