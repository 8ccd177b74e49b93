use thiserror::Error;

use crate::models::date_key::DateKey;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid date key: {0}")]
    InvalidDate(String),

    #[error("Invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("An on-this-day fact is already stored for {0}")]
    FactAlreadyStored(DateKey),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
