//! Core library for geomap.
//!
//! Records companies and their coordinates through a REST service and keeps
//! a local, cache-synchronized view of them for the map:
//!
//! - `api`: the HTTP client (`ApiClient`) and the `CompanyApi` trait
//! - `models`: `Company` and the request/response payloads
//! - `validation`: form coercion and field checks run before any request
//! - `query`: the `QueryClient` cache with stale-while-revalidate reads and
//!   mutation-driven updates
//! - `config`: settings from the config file and `GEOMAP_*` variables

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod validation;

pub use api::{ApiClient, ApiError, CompanyApi};
pub use config::Config;
pub use error::Error;
pub use models::{Company, CreateCompanyData, DeleteResponse, HealthStatus, Marker, UpdateCompanyData};
pub use query::{CacheEvent, QueryClient, QueryKey, QueryOptions, QueryStatus};
pub use validation::{
    CompanyForm, CoordinateInput, Field, FieldError, FieldErrorKind, UpdateCompanyForm,
    ValidationErrors,
};
