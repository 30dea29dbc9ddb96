use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::book::{Book, FieldValue};
use crate::models::query::{Field, Predicate, QuerySpec, SortDirection, Value};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid predicate on {field}: {reason}")]
    InvalidPredicate { field: Field, reason: String },
}

/// Records matching a query plus the number of matches before pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct BookPage {
    pub records: Vec<Book>,
    pub total: u64,
}

#[async_trait]
pub trait BookStore {
    async fn find_all(&self, spec: &QuerySpec) -> Result<BookPage, StorageError>;
    async fn test_connection(&self) -> Result<(), StorageError>;
}

pub type Backend = Arc<dyn BookStore + Send + Sync>;

pub struct MemoryBackend {
    books: Arc<Vec<Book>>,
}

impl MemoryBackend {
    /// Books are kept in id order, which is the store's natural order.
    pub fn new(mut books: Vec<Book>) -> Self {
        books.sort_by_key(|book| book.id);
        Self {
            books: Arc::new(books),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StorageError> {
        let raw = std::fs::read_to_string(path)?;
        let books: Vec<Book> = serde_json::from_str(&raw)?;
        info!("Loaded {} books from {}", books.len(), path.display());
        Ok(Self::new(books))
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn evaluate(&self, spec: &QuerySpec) -> Result<BookPage, StorageError> {
        let mut matched = Vec::new();
        for book in self.books.iter() {
            let keep = match &spec.filter {
                Some(predicate) => matches(predicate, book)?,
                None => true,
            };
            if keep {
                matched.push(book.clone());
            }
        }

        if let Some(sort) = spec.sort {
            // Stable sort keeps id order among equal keys.
            matched.sort_by(|a, b| {
                let ordering = compare_fields(a.field(sort.field), b.field(sort.field));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let total = matched.len() as u64;
        let records = match spec.page {
            Some(page) => matched
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.per_page as usize)
                .collect(),
            None => matched,
        };

        Ok(BookPage { records, total })
    }
}

#[async_trait]
impl BookStore for MemoryBackend {
    async fn find_all(&self, spec: &QuerySpec) -> Result<BookPage, StorageError> {
        self.evaluate(spec)
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

pub fn matches(predicate: &Predicate, book: &Book) -> Result<bool, StorageError> {
    match predicate {
        Predicate::Equals { field, value } => match book.field(*field) {
            FieldValue::Integer(actual) => Ok(actual == integer_operand(*field, value)?),
            FieldValue::Text(actual) => Ok(actual == value.to_string()),
        },
        Predicate::Between { field, start, end } => match book.field(*field) {
            FieldValue::Integer(actual) => {
                let low = integer_operand(*field, start)?;
                let high = integer_operand(*field, end)?;
                Ok(low <= actual && actual <= high)
            }
            FieldValue::Text(actual) => {
                let (low, high) = (start.to_string(), end.to_string());
                Ok(low.as_str() <= actual && actual <= high.as_str())
            }
        },
        Predicate::Contains { field, needle } => match book.field(*field) {
            FieldValue::Text(actual) => {
                Ok(actual.to_lowercase().contains(&needle.to_lowercase()))
            }
            FieldValue::Integer(actual) => Ok(actual.to_string().contains(needle.as_str())),
        },
        Predicate::And { predicates } => {
            for inner in predicates {
                if !matches(inner, book)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn integer_operand(field: Field, value: &Value) -> Result<i64, StorageError> {
    match value {
        Value::Integer(number) => Ok(*number),
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| StorageError::InvalidPredicate {
                field,
                reason: format!("'{}' is not an integer", text),
            }),
    }
}

fn compare_fields(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(&y),
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Integer(_), FieldValue::Text(_)) => Ordering::Less,
        (FieldValue::Text(_), FieldValue::Integer(_)) => Ordering::Greater,
    }
}

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }
}

const BOOK_COLUMNS: &str = "id, title, author, publisher, year, created_at, updated_at";

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, field: Field, value: &Value) {
    match value {
        Value::Integer(number) if field.is_numeric() => {
            builder.push_bind(*number);
        }
        Value::Integer(number) => {
            builder.push_bind(number.to_string());
        }
        Value::Text(text) if field.is_numeric() => {
            // Postgres rejects the cast for non-numeric input, which surfaces as a store error.
            builder.push_bind(text.clone());
            builder.push("::bigint");
        }
        Value::Text(text) => {
            builder.push_bind(text.clone());
        }
    }
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Equals { field, value } => {
            builder.push(field.column()).push(" = ");
            push_value(builder, *field, value);
        }
        Predicate::Between { field, start, end } => {
            builder.push(field.column()).push(" BETWEEN ");
            push_value(builder, *field, start);
            builder.push(" AND ");
            push_value(builder, *field, end);
        }
        Predicate::Contains { field, needle } => {
            if field.is_numeric() {
                builder.push(field.column()).push("::text ILIKE ");
            } else {
                builder.push(field.column()).push(" ILIKE ");
            }
            builder.push_bind(format!("%{}%", escape_like(needle)));
        }
        Predicate::And { predicates } if predicates.is_empty() => {
            builder.push("TRUE");
        }
        Predicate::And { predicates } => {
            builder.push("(");
            for (i, inner) in predicates.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                push_predicate(builder, inner);
            }
            builder.push(")");
        }
    }
}

pub fn select_query(spec: &QuerySpec) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM books", BOOK_COLUMNS));

    if let Some(filter) = &spec.filter {
        builder.push(" WHERE ");
        push_predicate(&mut builder, filter);
    }

    builder.push(" ORDER BY ");
    if let Some(sort) = spec.sort {
        let direction = match sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        builder.push(format!("{} {}, ", sort.field.column(), direction));
    }
    builder.push("id ASC");

    if let Some(page) = spec.page {
        builder.push(" LIMIT ").push_bind(i64::from(page.per_page));
        builder.push(" OFFSET ").push_bind(page.offset() as i64);
    }

    builder
}

pub fn count_query(spec: &QuerySpec) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) AS count FROM books");
    if let Some(filter) = &spec.filter {
        builder.push(" WHERE ");
        push_predicate(&mut builder, filter);
    }
    builder
}

fn book_from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: row.try_get::<i64, _>("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        publisher: row.try_get("publisher")?,
        year: row.try_get::<i32, _>("year")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl BookStore for PostgresBackend {
    async fn find_all(&self, spec: &QuerySpec) -> Result<BookPage, StorageError> {
        let mut select = select_query(spec);
        debug!("Executing: {}", select.sql());

        let rows = select.build().fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(book_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let total = if spec.page.is_some() {
            let mut count = count_query(spec);
            count
                .build()
                .fetch_one(&self.pool)
                .await?
                .try_get::<i64, _>("count")? as u64
        } else {
            records.len() as u64
        };

        Ok(BookPage { records, total })
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::sample_catalog;
    use crate::models::query::PageSpec;
    use std::io::Write;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(sample_catalog())
    }

    fn ids(page: &BookPage) -> Vec<i64> {
        page.records.iter().map(|book| book.id).collect()
    }

    #[test]
    fn unfiltered_query_returns_everything_in_id_order() {
        let mut books = sample_catalog();
        books.reverse();
        let page = MemoryBackend::new(books).evaluate(&QuerySpec::new()).unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(ids(&page), (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn contains_ignores_case() {
        let spec = QuerySpec::new().filter(Predicate::contains(Field::Title, "PEMIMPI"));
        let page = backend().evaluate(&spec).unwrap();
        assert_eq!(ids(&page), vec![6]);
    }

    #[test]
    fn between_is_inclusive() {
        let spec = QuerySpec::new().filter(Predicate::between(
            Field::Year,
            Value::Integer(2002),
            Value::Integer(2005),
        ));
        let page = backend().evaluate(&spec).unwrap();
        assert_eq!(ids(&page), vec![1, 4, 12]);
    }

    #[test]
    fn between_with_inverted_bounds_matches_nothing() {
        let spec = QuerySpec::new().filter(Predicate::between(
            Field::Year,
            Value::Integer(2005),
            Value::Integer(2002),
        ));
        assert!(backend().evaluate(&spec).unwrap().records.is_empty());
    }

    #[test]
    fn non_numeric_bound_is_a_store_error() {
        let spec = QuerySpec::new().filter(Predicate::between(
            Field::Year,
            Value::Text("yesterday".into()),
            Value::Integer(2005),
        ));
        let err = backend().evaluate(&spec).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPredicate { field: Field::Year, .. }));
    }

    #[test]
    fn sort_descending_keeps_id_order_for_ties() {
        let spec = QuerySpec::new().sort_by(Field::Year, SortDirection::Desc);
        let page = backend().evaluate(&spec).unwrap();
        let years: Vec<i32> = page.records.iter().map(|book| book.year).collect();

        assert!(years.windows(2).all(|pair| pair[0] >= pair[1]));
        let tied: Vec<i64> = page
            .records
            .iter()
            .filter(|book| book.year == 2009)
            .map(|book| book.id)
            .collect();
        assert_eq!(tied, vec![5, 10]);
    }

    #[test]
    fn pagination_reports_total_before_slicing() {
        let spec = QuerySpec::new().paginate(PageSpec { per_page: 5, page: 3 });
        let page = backend().evaluate(&spec).unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(ids(&page), vec![11, 12]);
    }

    #[test]
    fn select_query_binds_values_and_orders_by_id() {
        let spec = QuerySpec::new()
            .filter(Predicate::equals(Field::Publisher, Value::Text("Gramedia".into())))
            .filter(Predicate::equals(Field::Author, Value::Text("Eka Kurniawan".into())))
            .sort_by(Field::Year, SortDirection::Desc)
            .paginate(PageSpec::default());
        let builder = select_query(&spec);

        assert_eq!(
            builder.sql(),
            "SELECT id, title, author, publisher, year, created_at, updated_at FROM books \
             WHERE (publisher = $1 AND author = $2) ORDER BY year DESC, id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn select_query_casts_text_against_numeric_columns() {
        let spec = QuerySpec::new().filter(Predicate::between(
            Field::Year,
            Value::Text("abc".into()),
            Value::Integer(2000),
        ));
        let builder = select_query(&spec);
        assert!(builder.sql().contains("year BETWEEN $1::bigint AND $2"));
    }

    #[test]
    fn count_query_reuses_the_filter_without_paging() {
        let spec = QuerySpec::new()
            .filter(Predicate::contains(Field::Title, "bumi"))
            .sort_by(Field::Year, SortDirection::Asc)
            .paginate(PageSpec::default());
        let builder = count_query(&spec);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) AS count FROM books WHERE title ILIKE $1"
        );
    }

    #[test]
    fn count_query_without_filter() {
        assert_eq!(
            count_query(&QuerySpec::new()).sql(),
            "SELECT COUNT(*) AS count FROM books"
        );
    }

    #[test]
    fn seed_file_loads_in_id_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 2, "title": "Saman", "author": "Ayu Utami", "publisher": "KPG", "year": 1998}},
                {{"id": 1, "title": "Pulang", "author": "Leila S. Chudori", "publisher": "KPG", "year": 2012}}
            ]"#
        )
        .unwrap();

        let backend = MemoryBackend::from_json_file(file.path()).unwrap();
        let page = backend.evaluate(&QuerySpec::new()).unwrap();

        assert_eq!(backend.len(), 2);
        assert_eq!(ids(&page), vec![1, 2]);
        assert_eq!(page.records[0].created_at, None);
    }

    #[test]
    fn malformed_seed_file_is_a_serialization_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"id\": \"not a book\"").unwrap();

        let err = MemoryBackend::from_json_file(file.path()).err().unwrap();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn missing_seed_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemoryBackend::from_json_file(&dir.path().join("absent.json"))
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }
}
