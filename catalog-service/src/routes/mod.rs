pub mod books;
pub mod health;

use axum::{http::StatusCode, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::models::storage::Backend;

#[derive(Clone)]
pub struct AppState {
    pub store: Backend,
    pub missing_parameter_status: StatusCode,
}

impl AppState {
    pub fn new(store: Backend) -> Self {
        Self {
            store,
            missing_parameter_status: StatusCode::OK,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(health::health_check))
        .route("/books", get(books::list_books))
        .route("/books/search", get(books::search_books))
        .route("/books/filter/year", get(books::filter_by_year))
        .route("/books/filter", get(books::filter_by_publisher_and_author))
        .route("/books/range", get(books::filter_by_year_range))
        .route("/books/sort", get(books::sort_by_year))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
