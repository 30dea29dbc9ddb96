use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Deserialize, Serialize, Debug)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
}

/// Uniform wrapper returned by every book endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub current_page: u32,
    pub data: Vec<T>,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, per_page: u32, current_page: u32) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            total.div_ceil(u64::from(per_page)) as u32
        };
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = u64::from(current_page.saturating_sub(1)) * u64::from(per_page) + 1;
            (Some(first), Some(first + data.len() as u64 - 1))
        };

        Self {
            current_page,
            data,
            per_page,
            total,
            last_page,
            from,
            to,
        }
    }
}

/// Empty `data` payload used by failures that carry no detail.
pub fn empty_data() -> JsonValue {
    JsonValue::Array(Vec::new())
}
