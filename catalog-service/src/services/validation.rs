//! Input contracts checked before any store access.
//!
//! Every function here is pure: it reads a [`RawParams`] map and either returns
//! the typed value the endpoint needs or an [`ApiError`].

use std::collections::HashMap;

use crate::error::{ApiError, FieldErrors};
use crate::models::query::PageSpec;

/// Query string as received, before any endpoint-specific interpretation.
#[derive(Debug, Clone, Default)]
pub struct RawParams(HashMap<String, String>);

impl RawParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    /// Trimmed value; present-but-blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Value exactly as sent, blank or not.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

pub const VALIDATION_MESSAGE: &str = "Validation error";

pub fn validate_pagination(params: &RawParams) -> Result<PageSpec, ApiError> {
    let page = current_page(params);
    let Some(raw) = params.raw("paginate") else {
        return Ok(PageSpec {
            per_page: PageSpec::DEFAULT_PER_PAGE,
            page,
        });
    };

    let max = i64::from(PageSpec::MAX_PER_PAGE);
    let message = match raw.trim().parse::<i64>() {
        Ok(per_page) if (1..=max).contains(&per_page) => {
            return Ok(PageSpec {
                per_page: per_page as u32,
                page,
            })
        }
        Ok(per_page) if per_page < 1 => "The paginate field must be at least 1.".to_string(),
        Ok(_) => format!("The paginate field must not be greater than {}.", max),
        Err(_) => "The paginate field must be an integer.".to_string(),
    };

    let mut errors = FieldErrors::new();
    errors.add("paginate", message);
    Err(ApiError::validation(VALIDATION_MESSAGE, errors))
}

/// Unusable `page` values fall back to the first page instead of failing.
fn current_page(params: &RawParams) -> u32 {
    params
        .get("page")
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

pub fn require_param<'a>(params: &'a RawParams, name: &str) -> Result<&'a str, ApiError> {
    params.get(name).ok_or_else(|| {
        ApiError::MissingParameter(format!("{} parameter is required", capitalize(name)))
    })
}

pub fn require_at_least_one(params: &RawParams, names: &[&str]) -> Result<(), ApiError> {
    if names.iter().any(|name| params.get(name).is_some()) {
        return Ok(());
    }
    Err(ApiError::MissingParameter(format!(
        "At least one parameter ({}) is required",
        names.join(" or ")
    )))
}

pub fn require_all<'a, const N: usize>(
    params: &'a RawParams,
    names: [&str; N],
) -> Result<[&'a str; N], ApiError> {
    let mut values = [""; N];
    for (slot, name) in values.iter_mut().zip(names) {
        *slot = params.get(name).ok_or_else(|| {
            let message = match &names[..] {
                [first, second] => {
                    format!("Both {} and {} parameters are required", first, second)
                }
                _ => format!("Parameters {} are all required", names.join(", ")),
            };
            ApiError::MissingParameter(message)
        })?;
    }
    Ok(values)
}

/// Returns `default` when `value` is absent; rejects anything outside `allowed`.
pub fn validate_enum<'a>(
    field: &str,
    value: Option<&'a str>,
    allowed: &[&'a str],
    default: &'a str,
) -> Result<&'a str, ApiError> {
    let Some(value) = value else {
        return Ok(default);
    };
    if allowed.contains(&value) {
        return Ok(value);
    }

    let quoted: Vec<String> = allowed.iter().map(|choice| format!("'{}'", choice)).collect();
    let message = format!("{} must be {}", capitalize(field), quoted.join(" or "));
    let mut errors = FieldErrors::new();
    errors.add(field, message.clone());
    Err(ApiError::validation(message, errors))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
