//! Data models for the company map.
//!
//! This module contains the data structures exchanged with the REST API:
//!
//! - `Company`: the stored entity, with server-assigned `id`
//! - `CreateCompanyData`, `UpdateCompanyData`: request payloads
//! - `DeleteResponse`, `HealthStatus`: small response envelopes
//! - `Marker`: a company projected onto the map

pub mod company;

pub use company::{
    format_coordinate, is_valid_latitude, is_valid_longitude, Company, CreateCompanyData,
    DeleteResponse, HealthStatus, Marker, UpdateCompanyData, LATITUDE_RANGE, LONGITUDE_RANGE,
};
