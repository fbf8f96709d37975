// Shared by several test binaries; each uses a different subset.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use geomap_core::{
    ApiError, Company, CompanyApi, CreateCompanyData, DeleteResponse, UpdateCompanyData,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub fn company(id: i64, name: &str) -> Company {
    Company {
        id,
        name: name.to_string(),
        industry: Some("Tech".to_string()),
        latitude: id as f64,
        longitude: -(id as f64),
        address: None,
    }
}

pub fn acme() -> CreateCompanyData {
    CreateCompanyData {
        name: "Acme".to_string(),
        industry: "Tech".to_string(),
        latitude: 10.0,
        longitude: 20.0,
        address: None,
    }
}

fn status_error(status: StatusCode) -> ApiError {
    ApiError::from_status(
        reqwest::StatusCode::from_u16(status.as_u16()).unwrap(),
        "",
    )
}

// ============================================================================
// In-memory CompanyApi
// ============================================================================

#[derive(Default)]
struct FakeState {
    companies: Vec<Company>,
    next_id: i64,
    calls: HashMap<&'static str, usize>,
    fail_reads: bool,
    fail_mutations: bool,
    read_delay: Duration,
}

/// A `CompanyApi` backed by a vector, with call counters and switchable
/// failures. Clones share state so tests can steer the server while a
/// `QueryClient` owns another clone.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn with_companies(companies: Vec<Company>) -> Self {
        let next_id = companies.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let api = Self::default();
        {
            let mut state = api.state.lock();
            state.companies = companies;
            state.next_id = next_id;
        }
        api
    }

    pub fn calls(&self, op: &str) -> usize {
        self.state.lock().calls.get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.state.lock().fail_mutations = fail;
    }

    /// Delay read responses; the answer is captured before the delay.
    pub fn set_read_delay(&self, delay: Duration) {
        self.state.lock().read_delay = delay;
    }

    /// Change server state behind the client's back.
    pub fn server_insert(&self, company: Company) {
        let mut state = self.state.lock();
        state.next_id = state.next_id.max(company.id + 1);
        state.companies.push(company);
    }

    pub fn server_companies(&self) -> Vec<Company> {
        self.state.lock().companies.clone()
    }

    fn record(&self, op: &'static str) {
        *self.state.lock().calls.entry(op).or_insert(0) += 1;
    }

    fn read_outcome<T>(&self, f: impl FnOnce(&FakeState) -> Result<T, ApiError>) -> (Duration, Result<T, ApiError>) {
        let state = self.state.lock();
        let result = if state.fail_reads {
            Err(status_error(StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            f(&state)
        };
        (state.read_delay, result)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut FakeState) -> Result<T, ApiError>) -> Result<T, ApiError> {
        let mut state = self.state.lock();
        if state.fail_mutations {
            return Err(status_error(StatusCode::INTERNAL_SERVER_ERROR));
        }
        f(&mut state)
    }
}

#[async_trait]
impl CompanyApi for FakeApi {
    async fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.record("list");
        let (delay, result) = self.read_outcome(|s| Ok(s.companies.clone()));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn get_company(&self, id: i64) -> Result<Company, ApiError> {
        self.record("get");
        let (delay, result) = self.read_outcome(|s| {
            s.companies
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| status_error(StatusCode::NOT_FOUND))
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn create_company(&self, data: &CreateCompanyData) -> Result<Company, ApiError> {
        self.record("create");
        self.mutate(|s| {
            let company = Company {
                id: s.next_id,
                name: data.name.clone(),
                industry: Some(data.industry.clone()),
                latitude: data.latitude,
                longitude: data.longitude,
                address: data.address.clone(),
            };
            s.next_id += 1;
            s.companies.push(company.clone());
            Ok(company)
        })
    }

    async fn update_company(&self, id: i64, data: &UpdateCompanyData) -> Result<Company, ApiError> {
        self.record("update");
        self.mutate(|s| {
            let company = s
                .companies
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| status_error(StatusCode::NOT_FOUND))?;
            company.apply(data);
            Ok(company.clone())
        })
    }

    async fn delete_company(&self, id: i64) -> Result<DeleteResponse, ApiError> {
        self.record("delete");
        self.mutate(|s| {
            let before = s.companies.len();
            s.companies.retain(|c| c.id != id);
            if s.companies.len() == before {
                return Err(status_error(StatusCode::NOT_FOUND));
            }
            Ok(DeleteResponse {
                message: "Company deleted successfully".to_string(),
            })
        })
    }
}

// ============================================================================
// HTTP mock of the company service
// ============================================================================

type Db = Arc<tokio::sync::RwLock<(i64, HashMap<i64, Company>)>>;

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": "Company not found", "status_code": 404})),
    )
}

async fn list(State(db): State<Db>) -> Json<Vec<Company>> {
    let db = db.read().await;
    let mut companies: Vec<Company> = db.1.values().cloned().collect();
    companies.sort_by_key(|c| c.id);
    Json(companies)
}

async fn create(State(db): State<Db>, Json(input): Json<CreateCompanyData>) -> Json<Company> {
    let mut db = db.write().await;
    db.0 += 1;
    let company = Company {
        id: db.0,
        name: input.name,
        industry: Some(input.industry),
        latitude: input.latitude,
        longitude: input.longitude,
        address: input.address,
    };
    db.1.insert(company.id, company.clone());
    Json(company)
}

async fn fetch_one(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Company>, (StatusCode, Json<Value>)> {
    let db = db.read().await;
    db.1.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCompanyData>,
) -> Result<Json<Company>, (StatusCode, Json<Value>)> {
    let mut db = db.write().await;
    let company = db.1.get_mut(&id).ok_or_else(not_found)?;
    company.apply(&input);
    Ok(Json(company.clone()))
}

async fn remove(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut db = db.write().await;
    db.1.remove(&id).ok_or_else(not_found)?;
    Ok(Json(json!({"message": "Company deleted successfully"})))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "database": "connected",
        "timestamp": "2024-01-01T00:00:00Z",
        "version": "1.0.0"
    }))
}

async fn broken() -> &'static str {
    "this is not json"
}

pub fn mock_app() -> Router {
    let db: Db = Arc::new(tokio::sync::RwLock::new((0, HashMap::new())));
    Router::new()
        .route("/api/v1/companies", get(list).post(create))
        .route(
            "/api/v1/companies/{id}",
            get(fetch_one).put(update).delete(remove),
        )
        .route("/health", get(health))
        .route("/broken/api/v1/companies", get(broken))
        .with_state(db)
}

/// Serve the mock on a random local port and return its base URL.
pub async fn spawn_mock_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, mock_app()).await.unwrap();
    });
    format!("http://{}", addr)
}
