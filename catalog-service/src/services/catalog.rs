//! Per-endpoint parameter structs, the queries they compose, and execution
//! against the configured store.

use tracing::info;

use crate::error::ApiError;
use crate::models::query::{Field, PageSpec, Predicate, QuerySpec, SortDirection, Value};
use crate::models::storage::{Backend, BookPage};
use crate::services::validation::{
    require_all, require_at_least_one, require_param, validate_enum, validate_pagination,
    RawParams,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: PageSpec,
}

impl ListParams {
    pub fn from_params(params: &RawParams) -> Result<Self, ApiError> {
        Ok(Self {
            page: validate_pagination(params)?,
        })
    }

    pub fn query(&self) -> QuerySpec {
        QuerySpec::new().paginate(self.page)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleSearchParams {
    pub title: String,
}

impl TitleSearchParams {
    pub fn from_params(params: &RawParams) -> Result<Self, ApiError> {
        Ok(Self {
            title: require_param(params, "title")?.to_string(),
        })
    }

    pub fn query(&self) -> QuerySpec {
        QuerySpec::new().filter(Predicate::contains(Field::Title, self.title.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearParams {
    pub year: Value,
}

impl YearParams {
    pub fn from_params(params: &RawParams) -> Result<Self, ApiError> {
        Ok(Self {
            year: Value::from_param(require_param(params, "year")?),
        })
    }

    pub fn query(&self) -> QuerySpec {
        QuerySpec::new().filter(Predicate::equals(Field::Year, self.year.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublisherAuthorParams {
    pub publisher: Option<String>,
    pub author: Option<String>,
}

impl PublisherAuthorParams {
    pub fn from_params(params: &RawParams) -> Result<Self, ApiError> {
        require_at_least_one(params, &["publisher", "author"])?;
        Ok(Self {
            publisher: params.get("publisher").map(str::to_string),
            author: params.get("author").map(str::to_string),
        })
    }

    pub fn query(&self) -> QuerySpec {
        let mut spec = QuerySpec::new();
        if let Some(publisher) = &self.publisher {
            spec = spec.filter(Predicate::equals(
                Field::Publisher,
                Value::Text(publisher.clone()),
            ));
        }
        if let Some(author) = &self.author {
            spec = spec.filter(Predicate::equals(Field::Author, Value::Text(author.clone())));
        }
        spec
    }
}

/// Bounds are handed to the store unchecked; a non-numeric bound becomes a store error.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRangeParams {
    pub start: Value,
    pub end: Value,
}

impl YearRangeParams {
    pub fn from_params(params: &RawParams) -> Result<Self, ApiError> {
        let [start, end] = require_all(params, ["start", "end"])?;
        Ok(Self {
            start: Value::from_param(start),
            end: Value::from_param(end),
        })
    }

    pub fn query(&self) -> QuerySpec {
        QuerySpec::new().filter(Predicate::between(
            Field::Year,
            self.start.clone(),
            self.end.clone(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortParams {
    pub direction: SortDirection,
}

impl SortParams {
    pub fn from_params(params: &RawParams) -> Result<Self, ApiError> {
        let order = validate_enum(
            "order",
            params.get("order"),
            &SortDirection::ALLOWED,
            SortDirection::Asc.as_str(),
        )?;
        Ok(Self {
            direction: SortDirection::parse(order).unwrap_or_default(),
        })
    }

    pub fn query(&self) -> QuerySpec {
        QuerySpec::new().sort_by(Field::Year, self.direction)
    }
}

pub async fn execute(store: &Backend, spec: &QuerySpec) -> Result<BookPage, ApiError> {
    let page = store.find_all(spec).await?;
    info!(
        "Query matched {} books, returning {}",
        page.total,
        page.records.len()
    );
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::sample_catalog;
    use crate::models::storage::{BookStore, MemoryBackend, StorageError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn list_query_is_paginated_without_filter() {
        let list = ListParams::from_params(&params(&[("paginate", "3"), ("page", "2")])).unwrap();
        let spec = list.query();

        assert_eq!(spec.filter, None);
        assert_eq!(spec.page, Some(PageSpec { per_page: 3, page: 2 }));
        assert_eq!(spec.sort, None);
    }

    #[test]
    fn title_search_uses_substring_predicate() {
        let search = TitleSearchParams::from_params(&params(&[("title", "foo")])).unwrap();
        assert_eq!(
            search.query().filter,
            Some(Predicate::contains(Field::Title, "foo"))
        );
    }

    #[test]
    fn title_search_trims_the_needle() {
        let search = TitleSearchParams::from_params(&params(&[("title", " bumi ")])).unwrap();
        assert_eq!(search.title, "bumi");
        assert_eq!(
            search.query().filter,
            Some(Predicate::contains(Field::Title, "bumi"))
        );
    }

    #[test]
    fn publisher_and_author_are_conjoined() {
        let filter = PublisherAuthorParams::from_params(&params(&[
            ("publisher", "Gramedia"),
            ("author", "Eka Kurniawan"),
        ]))
        .unwrap();

        assert_eq!(
            filter.query().filter,
            Some(Predicate::And {
                predicates: vec![
                    Predicate::equals(Field::Publisher, Value::Text("Gramedia".into())),
                    Predicate::equals(Field::Author, Value::Text("Eka Kurniawan".into())),
                ],
            })
        );
    }

    #[test]
    fn single_publisher_is_one_predicate() {
        let filter = PublisherAuthorParams::from_params(&params(&[("publisher", "Gramedia")])).unwrap();
        assert_eq!(
            filter.query().filter,
            Some(Predicate::equals(Field::Publisher, Value::Text("Gramedia".into())))
        );
    }

    #[test]
    fn range_keeps_raw_bounds() {
        let range = YearRangeParams::from_params(&params(&[("start", "1990"), ("end", "soon")])).unwrap();
        assert_eq!(range.start, Value::Integer(1990));
        assert_eq!(range.end, Value::Text("soon".into()));
    }

    #[test]
    fn sort_defaults_to_ascending() {
        let sort = SortParams::from_params(&params(&[])).unwrap();
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = SortParams::from_params(&params(&[("order", "desc")])).unwrap();
        assert_eq!(sort.query().sort.map(|s| s.direction), Some(SortDirection::Desc));
    }

    struct CountingStore {
        inner: MemoryBackend,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BookStore for CountingStore {
        async fn find_all(&self, spec: &QuerySpec) -> Result<BookPage, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_all(spec).await
        }

        async fn test_connection(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn execute_runs_the_composed_query() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store: Backend = Arc::new(CountingStore {
            inner: MemoryBackend::new(sample_catalog()),
            calls: Arc::clone(&calls),
        });

        let spec = YearParams::from_params(&params(&[("year", "1980")])).unwrap().query();
        let page = execute(&store, &spec).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(page.records.iter().all(|book| book.year == 1980));
        assert_eq!(page.total, 2);
    }
}
