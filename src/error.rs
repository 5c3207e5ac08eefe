//! ==============================================================================
//! error.rs - failure taxonomy for the dashboard views
//! ==============================================================================
//!
//! purpose:
//!     every section of the page can fail on its own. these types describe
//!     why, so the page can show an inline notice and carry on with the
//!     remaining sections.
//!
//! relationships:
//!     - produced by: fetcher.rs (FetchError), series.rs (SchemaError)
//!     - consumed by: dashboard.rs (turned into inline notices)
//!
//! ==============================================================================

use thiserror::Error;

use crate::fetcher::Endpoint;

/// the upstream request itself failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// connection refused, dns failure, timeout, body read error...
    #[error("Error fetching data from {endpoint}: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("Error fetching data from {endpoint}: HTTP {status}")]
    Status {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
    },

    #[error("Error fetching data from {endpoint}: malformed JSON: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

/// the payload decoded fine but is not an array of {time, value} records
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("expected an array of readings, found {found}")]
    NotAnArray { found: &'static str },

    #[error("record {index} is not an object")]
    NotARecord { index: usize },

    #[error("record {index} is missing field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index} field `{field}` should be {expected}")]
    WrongType {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("record {index} has an unrecognised time {value:?}")]
    BadTimestamp { index: usize, value: String },
}

/// outcome of one chart+table view
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid data from {endpoint}: {source}")]
    Schema {
        endpoint: Endpoint,
        #[source]
        source: SchemaError,
    },
}
