use crate::error::ApiError;
use crate::models::book::Book;
use crate::models::responses::Paginated;
use crate::routes::AppState;
use crate::services::catalog::{
    execute, ListParams, PublisherAuthorParams, SortParams, TitleSearchParams, YearParams,
    YearRangeParams,
};
use crate::services::formatter;
use crate::services::validation::RawParams;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

type QueryMap = Query<HashMap<String, String>>;

fn respond<T: Serialize>(state: &AppState, result: Result<(String, T), ApiError>) -> Response {
    match result {
        Ok((message, data)) => formatter::ok(message, data).into_response(),
        Err(err) => formatter::from_error(&err, state.missing_parameter_status).into_response(),
    }
}

async fn list(state: &AppState, params: &RawParams) -> Result<(String, Paginated<Book>), ApiError> {
    let list = ListParams::from_params(params)?;
    let page = execute(&state.store, &list.query()).await?;
    Ok((
        "Data retrieved successfully".to_string(),
        Paginated::new(page.records, page.total, list.page.per_page, list.page.page),
    ))
}

pub async fn list_books(State(state): State<AppState>, Query(params): QueryMap) -> Response {
    info!("List books: {:?}", params);
    let result = list(&state, &RawParams::new(params)).await;
    respond(&state, result)
}

async fn search(state: &AppState, params: &RawParams) -> Result<(String, Vec<Book>), ApiError> {
    let search = TitleSearchParams::from_params(params)?;
    let page = execute(&state.store, &search.query()).await?;
    Ok((
        "Search results retrieved successfully".to_string(),
        page.records,
    ))
}

pub async fn search_books(State(state): State<AppState>, Query(params): QueryMap) -> Response {
    info!("Search books: {:?}", params);
    let result = search(&state, &RawParams::new(params)).await;
    respond(&state, result)
}

async fn by_year(state: &AppState, params: &RawParams) -> Result<(String, Vec<Book>), ApiError> {
    let filter = YearParams::from_params(params)?;
    let page = execute(&state.store, &filter.query()).await?;
    Ok((
        "Books filtered by year successfully".to_string(),
        page.records,
    ))
}

pub async fn filter_by_year(State(state): State<AppState>, Query(params): QueryMap) -> Response {
    info!("Filter books by year: {:?}", params);
    let result = by_year(&state, &RawParams::new(params)).await;
    respond(&state, result)
}

async fn by_publisher_and_author(
    state: &AppState,
    params: &RawParams,
) -> Result<(String, Vec<Book>), ApiError> {
    let filter = PublisherAuthorParams::from_params(params)?;
    let page = execute(&state.store, &filter.query()).await?;
    Ok((
        "Books filtered by publisher and/or author".to_string(),
        page.records,
    ))
}

pub async fn filter_by_publisher_and_author(
    State(state): State<AppState>,
    Query(params): QueryMap,
) -> Response {
    info!("Filter books by publisher/author: {:?}", params);
    let result = by_publisher_and_author(&state, &RawParams::new(params)).await;
    respond(&state, result)
}

async fn by_year_range(
    state: &AppState,
    params: &RawParams,
) -> Result<(String, Vec<Book>), ApiError> {
    let range = YearRangeParams::from_params(params)?;
    let page = execute(&state.store, &range.query()).await?;
    Ok(("Books filtered by year range".to_string(), page.records))
}

pub async fn filter_by_year_range(
    State(state): State<AppState>,
    Query(params): QueryMap,
) -> Response {
    info!("Filter books by year range: {:?}", params);
    let result = by_year_range(&state, &RawParams::new(params)).await;
    respond(&state, result)
}

async fn by_year_order(
    state: &AppState,
    params: &RawParams,
) -> Result<(String, Vec<Book>), ApiError> {
    let sort = SortParams::from_params(params)?;
    let page = execute(&state.store, &sort.query()).await?;
    Ok((
        format!("Books sorted by year ({})", sort.direction.as_str()),
        page.records,
    ))
}

pub async fn sort_by_year(State(state): State<AppState>, Query(params): QueryMap) -> Response {
    info!("Sort books by year: {:?}", params);
    let result = by_year_order(&state, &RawParams::new(params)).await;
    respond(&state, result)
}
