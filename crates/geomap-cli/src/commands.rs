//! Subcommand handlers.
//!
//! Each handler prints its result to stdout. Mutations print the same
//! success or failure notice the web client shows as a toast.

use std::path::Path;

use anyhow::{bail, Result};

use geomap_core::models::format_coordinate;
use geomap_core::query::age_display;
use geomap_core::{
    ApiClient, ApiError, Company, CompanyForm, Config, Error, QueryClient, QueryKey,
    UpdateCompanyForm,
};

const UPDATE_FAILED: &str = "Failed to update company. Please try again.";

fn print_company(company: &Company) {
    println!("#{} {}", company.id, company.name);
    println!("  Industry:  {}", company.industry.as_deref().unwrap_or("-"));
    println!(
        "  Location:  {}, {}",
        format_coordinate(company.latitude),
        format_coordinate(company.longitude)
    );
    if let Some(address) = &company.address {
        println!("  Address:   {}", address);
    }
}

/// Print field errors, or the API error, and turn a failed mutation into a
/// process error carrying the user-facing notice.
fn report_failure(err: Error, notice: &str) -> anyhow::Error {
    if let Error::Validation(errors) = &err {
        for field_error in &errors.errors {
            eprintln!("  {}", field_error);
        }
        return anyhow::anyhow!("Invalid input: {} field error(s)", errors.len());
    }
    if let Some(detail) = err.api().and_then(ApiError::detail) {
        eprintln!("  {}", detail);
    }
    anyhow::Error::new(err).context(notice.to_string())
}

pub async fn list(client: &QueryClient) -> Result<()> {
    let companies = client.companies().await?;
    if companies.is_empty() {
        println!("No companies yet.");
        return Ok(());
    }
    for company in &companies {
        println!(
            "{:>5}  {:<30}  {:<20}  {}",
            company.id,
            company.name,
            company.industry.as_deref().unwrap_or("-"),
            company.marker().position()
        );
    }
    if let Some(age) = client.age(QueryKey::List) {
        println!("{} companies (updated {})", companies.len(), age_display(age));
    }
    Ok(())
}

pub async fn get(client: &QueryClient, id: i64) -> Result<()> {
    match client.company(id).await {
        Ok(company) => {
            print_company(&company);
            Ok(())
        }
        Err(err) if err.is_not_found() => bail!("Company {} not found", id),
        Err(err) => Err(err.into()),
    }
}

pub async fn create(client: &QueryClient, form: &CompanyForm) -> Result<()> {
    match client.submit_company(form).await {
        Ok(company) => {
            println!("Company created successfully!");
            print_company(&company);
            Ok(())
        }
        Err(err) => Err(report_failure(err, "Failed to create company. Please try again.")),
    }
}

pub async fn update(client: &QueryClient, id: i64, form: &UpdateCompanyForm) -> Result<()> {
    let data = match form.validate() {
        Ok(data) if data.is_empty() => bail!("Nothing to update: pass at least one field"),
        Ok(data) => data,
        Err(errors) => return Err(report_failure(errors.into(), UPDATE_FAILED)),
    };
    match client.update_company(id, &data).await {
        Ok(company) => {
            println!("Company updated successfully!");
            print_company(&company);
            Ok(())
        }
        Err(err) => Err(report_failure(err, UPDATE_FAILED)),
    }
}

pub async fn delete(client: &QueryClient, id: i64) -> Result<()> {
    match client.delete_company(id).await {
        Ok(_) => {
            println!("Company deleted successfully!");
            Ok(())
        }
        Err(err) => Err(report_failure(err, "Failed to delete company. Please try again.")),
    }
}

pub async fn map(client: &QueryClient) -> Result<()> {
    for marker in client.companies().await?.iter().map(Company::marker) {
        println!("{}\t{}", marker.position(), marker.label);
    }
    Ok(())
}

pub async fn health(api: &ApiClient) -> Result<()> {
    let health = api.health().await?;
    println!("Status:   {}", health.status);
    if let Some(database) = &health.database {
        println!("Database: {}", database);
    }
    if let Some(version) = &health.version {
        println!("Version:  {}", version);
    }
    if !health.is_healthy() {
        bail!("Service reports status \"{}\"", health.status);
    }
    Ok(())
}

/// Store the service URL in the config file at `path`, keeping its other
/// settings. Environment overrides are not written back.
pub fn set_url(path: &Path, url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        bail!("The API URL must not be empty");
    }
    let mut config = Config::load_from(path)?;
    config.api_url = Some(url.trim_end_matches('/').to_string());
    config.save_to(path)?;
    println!("Saved API URL to {}", path.display());
    Ok(())
}

pub fn show_config(config: &Config, path: &Path) -> Result<()> {
    let options = config.query_options();
    println!("Config file:     {}", path.display());
    println!("API URL:         {}", config.api_url.as_deref().unwrap_or("(not set)"));
    println!("Request timeout: {}s", config.request_timeout().as_secs());
    println!("List stale:      {}s", options.list_stale_time.as_secs());
    println!("Detail stale:    {}s", options.detail_stale_time.as_secs());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomap_core::CoordinateInput;

    // Nothing listens here; the tests below must fail before any request.
    fn offline_client() -> QueryClient {
        QueryClient::new(ApiClient::new("http://127.0.0.1:9").unwrap())
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let err = update(&offline_client(), 1, &UpdateCompanyForm::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Nothing to update"));
    }

    #[tokio::test]
    async fn test_update_with_invalid_field_stops_before_the_request() {
        let form = UpdateCompanyForm {
            latitude: Some(CoordinateInput::from("95")),
            ..Default::default()
        };
        let err = update(&offline_client(), 1, &form).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: 1 field error(s)");
    }

    #[test]
    fn test_set_url_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geomap").join("config.json");
        Config {
            list_stale_secs: Some(60),
            ..Default::default()
        }
        .save_to(&path)
        .unwrap();

        set_url(&path, " http://localhost:8000/ ").unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.api_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(saved.list_stale_secs, Some(60));
    }

    #[test]
    fn test_set_url_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        set_url(&path, "http://example.test").unwrap();
        assert_eq!(
            Config::load_from(&path).unwrap().api_url.as_deref(),
            Some("http://example.test")
        );
    }

    #[test]
    fn test_set_url_rejects_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(set_url(&path, "   ").is_err());
        assert!(!path.exists());
    }
}
