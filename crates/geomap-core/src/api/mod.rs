//! REST API client module for the company service.
//!
//! This module provides the `ApiClient` for listing, fetching, creating,
//! updating and deleting companies, and the `CompanyApi` trait the query
//! layer depends on.
//!
//! Non-2xx replies become `ApiError::Status`; unreachable hosts and
//! malformed bodies become `ApiError::Network` and `ApiError::Decode`.

pub mod client;
pub mod error;

pub use client::{ApiClient, CompanyApi, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
