//! Form validation for company input.
//!
//! Converts raw form fields into request payloads. Coordinates may arrive as
//! numbers or as text; blank text counts as a missing value, so it reports
//! "required" rather than a range error. Validation is pure: the same input
//! always yields the same payload or the same ordered list of field errors.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    is_valid_latitude, is_valid_longitude, CreateCompanyData, UpdateCompanyData, LATITUDE_RANGE,
    LONGITUDE_RANGE,
};

/// A coordinate as typed into a form: already numeric, or text to coerce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl From<f64> for CoordinateInput {
    fn from(value: f64) -> Self {
        CoordinateInput::Number(value)
    }
}

impl From<&str> for CoordinateInput {
    fn from(value: &str) -> Self {
        CoordinateInput::Text(value.to_string())
    }
}

impl From<String> for CoordinateInput {
    fn from(value: String) -> Self {
        CoordinateInput::Text(value)
    }
}

impl Default for CoordinateInput {
    fn default() -> Self {
        CoordinateInput::Text(String::new())
    }
}

impl CoordinateInput {
    /// Coerce to a number. `None` means the field was left blank; a
    /// non-numeric string coerces to NaN.
    fn resolve(&self) -> Option<f64> {
        match self {
            CoordinateInput::Number(n) => Some(*n),
            CoordinateInput::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.parse::<f64>().unwrap_or(f64::NAN))
                }
            }
        }
    }
}

/// Raw input of the create form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyForm {
    pub name: String,
    pub industry: String,
    pub latitude: CoordinateInput,
    pub longitude: CoordinateInput,
    #[serde(default)]
    pub address: Option<String>,
}

/// Raw input of the edit form; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCompanyForm {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub latitude: Option<CoordinateInput>,
    pub longitude: Option<CoordinateInput>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Industry,
    Latitude,
    Longitude,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Company name",
            Field::Industry => "Industry",
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Industry => "industry",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
        };
        f.write_str(name)
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldErrorKind {
    Required,
    NotANumber,
    BelowMin { min: f64 },
    AboveMax { max: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, kind: FieldErrorKind) -> Self {
        let label = field.label();
        let message = match kind {
            FieldErrorKind::Required => format!("{} is required", label),
            FieldErrorKind::NotANumber => format!("{} must be a number", label),
            FieldErrorKind::BelowMin { .. } | FieldErrorKind::AboveMax { .. } => {
                let range = coordinate_range(field);
                format!(
                    "{} must be between {} and {}",
                    label,
                    range.start(),
                    range.end()
                )
            }
        };
        Self { field, kind, message }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error found in one form, in field order.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn message(&self, field: Field) -> Option<&str> {
        self.get(field).map(|e| e.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

fn coordinate_range(field: Field) -> RangeInclusive<f64> {
    match field {
        Field::Longitude => LONGITUDE_RANGE,
        _ => LATITUDE_RANGE,
    }
}

fn check_required(field: Field, value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        Err(FieldError::new(field, FieldErrorKind::Required))
    } else {
        Ok(())
    }
}

fn check_coordinate(field: Field, input: &CoordinateInput) -> Result<f64, FieldError> {
    let value = input
        .resolve()
        .ok_or_else(|| FieldError::new(field, FieldErrorKind::Required))?;
    if value.is_nan() {
        return Err(FieldError::new(field, FieldErrorKind::NotANumber));
    }
    let in_range = match field {
        Field::Longitude => is_valid_longitude(value),
        _ => is_valid_latitude(value),
    };
    if in_range {
        return Ok(value);
    }
    let range = coordinate_range(field);
    let kind = if value < *range.start() {
        FieldErrorKind::BelowMin { min: *range.start() }
    } else {
        FieldErrorKind::AboveMax { max: *range.end() }
    };
    Err(FieldError::new(field, kind))
}

fn normalize_address(address: &Option<String>) -> Option<String> {
    address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

/// Collects field errors while keeping the successfully parsed values.
#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn take<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(ValidationErrors { errors: self.errors }),
        }
    }
}

impl CompanyForm {
    /// Validate the form and build the create payload.
    pub fn validate(&self) -> Result<CreateCompanyData, ValidationErrors> {
        let mut c = Collector::default();
        let name = c.take(check_required(Field::Name, &self.name));
        let industry = c.take(check_required(Field::Industry, &self.industry));
        let latitude = c.take(check_coordinate(Field::Latitude, &self.latitude));
        let longitude = c.take(check_coordinate(Field::Longitude, &self.longitude));

        let data = match (name, industry, latitude, longitude) {
            (Some(()), Some(()), Some(latitude), Some(longitude)) => Some(CreateCompanyData {
                name: self.name.clone(),
                industry: self.industry.clone(),
                latitude,
                longitude,
                address: normalize_address(&self.address),
            }),
            _ => None,
        };
        c.finish(data)
    }
}

impl UpdateCompanyForm {
    /// Validate only the fields that are present and build the update payload.
    pub fn validate(&self) -> Result<UpdateCompanyData, ValidationErrors> {
        let mut c = Collector::default();
        let mut data = UpdateCompanyData::default();

        if let Some(ref name) = self.name {
            if c.take(check_required(Field::Name, name)).is_some() {
                data.name = Some(name.clone());
            }
        }
        if let Some(ref industry) = self.industry {
            if c.take(check_required(Field::Industry, industry)).is_some() {
                data.industry = Some(industry.clone());
            }
        }
        if let Some(ref latitude) = self.latitude {
            data.latitude = c.take(check_coordinate(Field::Latitude, latitude));
        }
        if let Some(ref longitude) = self.longitude {
            data.longitude = c.take(check_coordinate(Field::Longitude, longitude));
        }
        // An explicit empty address clears it server-side.
        if let Some(ref address) = self.address {
            data.address = Some(address.trim().to_string());
        }

        c.finish(Some(data))
    }
}
