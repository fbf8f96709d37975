//! API client for the company REST service.
//!
//! `ApiClient` issues the five CRUD calls plus the health check against a
//! configured base URL. `CompanyApi` is the seam the query layer is written
//! against, so the cache can be driven by any implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{Company, CreateCompanyData, DeleteResponse, HealthStatus, UpdateCompanyData};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix of the versioned company endpoints.
const COMPANIES_PATH: &str = "/api/v1/companies";

/// Health check path (unversioned).
const HEALTH_PATH: &str = "/health";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The company operations offered by the REST service.
#[async_trait]
pub trait CompanyApi: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<Company>, ApiError>;

    async fn get_company(&self, id: i64) -> Result<Company, ApiError>;

    async fn create_company(&self, data: &CreateCompanyData) -> Result<Company, ApiError>;

    async fn update_company(&self, id: i64, data: &UpdateCompanyData)
        -> Result<Company, ApiError>;

    async fn delete_company(&self, id: i64) -> Result<DeleteResponse, ApiError>;
}

/// HTTP client for the company service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn companies_url(&self) -> String {
        format!("{}{}", self.base_url, COMPANIES_PATH)
    }

    fn company_url(&self, id: i64) -> String {
        format!("{}{}/{}", self.base_url, COMPANIES_PATH, id)
    }

    /// Check if response is successful, returning an error built from the
    /// status line (and any `detail` in the body) if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(
                status = status.as_u16(),
                body = %ApiError::truncate_body(&body),
                "Request failed"
            );
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request with an optional JSON body and decode the JSON reply.
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        debug!(%method, url, "Sending request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            // Sets Content-Type: application/json
            request = request.json(body);
        }

        let response = Self::check_response(request.send().await?).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Decode(format!("{} from {}", e, url)))
    }

    /// Query the service health endpoint
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        self.send(Method::GET, &url, None::<&()>).await
    }
}

#[async_trait]
impl CompanyApi for ApiClient {
    async fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.send(Method::GET, &self.companies_url(), None::<&()>).await
    }

    async fn get_company(&self, id: i64) -> Result<Company, ApiError> {
        self.send(Method::GET, &self.company_url(id), None::<&()>).await
    }

    async fn create_company(&self, data: &CreateCompanyData) -> Result<Company, ApiError> {
        self.send(Method::POST, &self.companies_url(), Some(data)).await
    }

    async fn update_company(
        &self,
        id: i64,
        data: &UpdateCompanyData,
    ) -> Result<Company, ApiError> {
        self.send(Method::PUT, &self.company_url(id), Some(data)).await
    }

    async fn delete_company(&self, id: i64) -> Result<DeleteResponse, ApiError> {
        self.send(Method::DELETE, &self.company_url(id), None::<&()>).await
    }
}
