use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::storage::StorageError;

/// Field name to the list of messages rejected for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },
    #[error("{0}")]
    MissingParameter(String),
    #[error("Failed to retrieve books")]
    Store(#[from] StorageError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>, errors: FieldErrors) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors,
        }
    }
}
