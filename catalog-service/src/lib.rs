//! Read-only HTTP API over a catalog of books.
//!
//! Requests flow through [`services::validation`] into a [`models::query::QuerySpec`],
//! are run by a [`models::storage::BookStore`], and come back wrapped by
//! [`services::formatter`].

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
