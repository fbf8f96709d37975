use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Valid latitude values in degrees.
pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude values in degrees.
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// A company as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Company {
    /// Project this company onto the map.
    pub fn marker(&self) -> Marker {
        let label = match self.industry.as_deref() {
            Some(industry) if !industry.is_empty() => format!("{} ({})", self.name, industry),
            _ => self.name.clone(),
        };
        Marker {
            id: self.id,
            label,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Apply a partial update locally, leaving absent fields untouched.
    pub fn apply(&mut self, update: &UpdateCompanyData) {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref industry) = update.industry {
            self.industry = Some(industry.clone());
        }
        if let Some(latitude) = update.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = update.longitude {
            self.longitude = longitude;
        }
        if let Some(ref address) = update.address {
            self.address = Some(address.clone());
        }
    }
}

/// Request payload for creating a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCompanyData {
    pub name: String,
    pub industry: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Request payload for a partial update. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCompanyData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UpdateCompanyData {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.industry.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.address.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Body of the service's `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// A map marker for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: i64,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Marker {
    /// Coordinates formatted as `lat, lng` with six decimals each.
    pub fn position(&self) -> String {
        format!(
            "{}, {}",
            format_coordinate(self.latitude),
            format_coordinate(self.longitude)
        )
    }
}

pub fn is_valid_latitude(lat: f64) -> bool {
    LATITUDE_RANGE.contains(&lat)
}

pub fn is_valid_longitude(lng: f64) -> bool {
    LONGITUDE_RANGE.contains(&lng)
}

/// Format a coordinate for display (six decimal places, roughly 0.1 m).
pub fn format_coordinate(value: f64) -> String {
    format!("{:.6}", value)
}
