//! QLink REST API client.
//!
//! A thin typed wrapper over the service's HTTP endpoints. The client owns
//! no domain logic: it authenticates requests, maps HTTP failures onto
//! [`ClientError`] and deserializes response bodies into the wire types at
//! the bottom of this module. Backend-level interpretation (caching,
//! defaults, job handles) lives in `qlink_backend`.

use crate::credentials::{AuthError, Credentials};
use chrono::{DateTime, Utc};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// API version sent with every request
const API_VERSION: &str = "2024-06-01";

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API error response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Application error code, when the server supplies one
        code: Option<i64>,
        /// Error message
        message: String,
    },

    /// Response could not be parsed into the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after: u64,
    },

    /// Service unavailable
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

/// Error body the service embeds in non-2xx responses
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: ErrorBodyInner,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBodyInner {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// QLink API client
#[derive(Clone)]
pub struct ApiClient {
    /// HTTP client
    http: reqwest::Client,

    /// Credentials
    credentials: Credentials,

    /// Base URL
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given credentials
    pub fn new(credentials: Credentials) -> Result<Self, ClientError> {
        credentials.validate()?;

        let base_url = credentials.url().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&credentials.auth_header())
                .map_err(|_| AuthError::InvalidTokenFormat)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("qlink/0.1.0 (Rust)"));
        headers.insert(
            HeaderName::from_static("qlink-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        // Instance scoping is a per-account header, not a URL component
        if let Some(instance) = credentials.instance() {
            headers.insert(
                HeaderName::from_static("qlink-instance"),
                HeaderValue::from_str(&instance.to_string())
                    .map_err(|_| AuthError::InvalidInstance(instance.to_string()))?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            credentials,
            base_url,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, ClientError> {
        let credentials = Credentials::from_env()?;
        Self::new(credentials)
    }

    // ========================================================================
    // Low-level HTTP methods
    // ========================================================================

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.delete(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// Handle an API response
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(ClientError::from)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// Map a non-2xx response onto a [`ClientError`]
    async fn error_from_response(response: reqwest::Response) -> ClientError {
        let status = response.status();
        match status.as_u16() {
            401 | 403 => ClientError::Auth(AuthError::AuthFailed(
                "Invalid or expired token".to_string(),
            )),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                ClientError::RateLimited { retry_after }
            }
            503 => ClientError::ServiceUnavailable,
            _ => {
                let text = response.text().await.unwrap_or_default();
                // The service embeds {"error": {"code", "message"}} in error
                // bodies; fall back to the raw text when it does not.
                match serde_json::from_str::<ErrorBody>(&text) {
                    Ok(body) => ClientError::Api {
                        status: status.as_u16(),
                        code: body.error.code,
                        message: body
                            .error
                            .message
                            .unwrap_or_else(|| status.to_string()),
                    },
                    Err(_) => ClientError::Api {
                        status: status.as_u16(),
                        code: None,
                        message: text,
                    },
                }
            }
        }
    }

    // ========================================================================
    // Backend endpoints
    // ========================================================================

    /// List the backends visible to this account
    pub async fn list_backends(&self) -> Result<Vec<BackendOverview>, ClientError> {
        let response: BackendsResponse = self.get("/backends").await?;
        Ok(response.backends)
    }

    /// Get the static configuration of a backend
    pub async fn backend_configuration(&self, name: &str) -> Result<Configuration, ClientError> {
        let path = format!("/backends/{}/configuration", name);
        self.get(&path).await
    }

    /// Get the live status of a backend
    pub async fn backend_status(&self, name: &str) -> Result<BackendStatus, ClientError> {
        let path = format!("/backends/{}/status", name);
        self.get(&path).await
    }

    /// Get backend device properties (calibration data).
    ///
    /// When `updated_before` is given, the server returns the most recent
    /// snapshot older than that timestamp. Returns `None` when the backend
    /// publishes no properties (simulators).
    pub async fn backend_properties(
        &self,
        name: &str,
        updated_before: Option<DateTime<Utc>>,
    ) -> Result<Option<DeviceProperties>, ClientError> {
        let path = match updated_before {
            Some(at) => format!(
                "/backends/{}/properties?updated_before={}",
                name,
                at.to_rfc3339()
            ),
            None => format!("/backends/{}/properties", name),
        };

        let raw: serde_json::Value = self.get(&path).await?;
        if raw.is_null() || raw.as_object().map(|o| o.is_empty()).unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(raw)?))
    }

    /// Get backend pulse defaults.
    ///
    /// Returns `None` when the backend has no pulse access.
    pub async fn backend_defaults(
        &self,
        name: &str,
    ) -> Result<Option<DeviceDefaults>, ClientError> {
        let path = format!("/backends/{}/defaults", name);

        let raw: serde_json::Value = self.get(&path).await?;
        if raw.is_null() || raw.as_object().map(|o| o.is_empty()).unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(raw)?))
    }

    /// Get the per-account job limit for a backend
    pub async fn backend_job_limit(&self, name: &str) -> Result<JobLimitResponse, ClientError> {
        let path = format!("/backends/{}/job-limit", name);
        self.get(&path).await
    }

    /// Get backend reservations overlapping the given window
    pub async fn backend_reservations(
        &self,
        name: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReservationResponse>, ClientError> {
        let mut path = format!("/backends/{}/reservations", name);
        let mut sep = '?';
        if let Some(start) = start {
            path.push_str(&format!("{}start={}", sep, start.to_rfc3339()));
            sep = '&';
        }
        if let Some(end) = end {
            path.push_str(&format!("{}end={}", sep, end.to_rfc3339()));
        }

        let response: ReservationsResponse = self.get(&path).await?;
        Ok(response.reservations)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Backends list response
#[derive(Debug, Clone, Deserialize)]
struct BackendsResponse {
    /// List of backends
    backends: Vec<BackendOverview>,
}

/// One entry of the backends listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendOverview {
    /// Backend name
    pub name: String,

    /// Number of qubits
    #[serde(rename = "n_qubits", alias = "num_qubits")]
    pub num_qubits: Option<usize>,

    /// Whether the backend is a simulator
    #[serde(default)]
    pub simulator: bool,

    /// Whether the backend is currently operational
    #[serde(default)]
    pub operational: bool,

    /// Backend version
    pub backend_version: Option<String>,
}

/// Static backend configuration.
///
/// Read-mostly: fetched once per backend object and never refreshed. The
/// name is the backend's immutable identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    /// Backend name
    pub backend_name: String,

    /// Backend version
    pub backend_version: String,

    /// Number of qubits
    pub n_qubits: usize,

    /// Basis gate names
    pub basis_gates: Vec<String>,

    /// Instruction names accepted in submitted programs
    #[serde(default)]
    pub supported_instructions: Vec<String>,

    /// Whether the backend is a simulator
    #[serde(default)]
    pub simulator: bool,

    /// Whether per-shot memory is supported
    #[serde(default)]
    pub memory: bool,

    /// Maximum shots per program
    pub max_shots: u64,

    /// Maximum number of programs per job; jobs above this are chunked
    pub max_experiments: Option<usize>,

    /// Qubit sample time in seconds
    pub dt: Option<f64>,

    /// Supported program repetition times in seconds
    #[serde(default)]
    pub rep_times: Vec<f64>,

    /// Default delay between programs in seconds
    pub default_rep_delay: Option<f64>,

    /// Supported range for `rep_delay`, `[min, max]` in seconds
    pub rep_delay_range: Option<[f64; 2]>,

    /// Whether `rep_delay` is honored instead of `rep_time`
    #[serde(default)]
    pub dynamic_reprate_enabled: bool,

    /// Whether excited-state-promoted readout is available
    #[serde(default)]
    pub measure_esp_enabled: bool,

    /// Whether pulse-level access is available
    #[serde(default)]
    pub open_pulse: bool,

    /// Simulation method declared by simulator backends
    pub simulation_method: Option<String>,

    /// Qubit coupling map
    pub coupling_map: Option<Vec<Vec<usize>>>,

    /// Human-readable description
    pub description: Option<String>,
}

impl Configuration {
    /// Check whether an instruction name is accepted by this backend
    pub fn supports_instruction(&self, name: &str) -> bool {
        self.supported_instructions.iter().any(|i| i == name)
    }
}

/// Live backend status.
///
/// All fields are required: a status response the server cannot fill
/// completely is a protocol error, not a partial result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Backend name
    pub backend_name: String,

    /// Backend version
    pub backend_version: String,

    /// Whether the backend accepts jobs
    pub operational: bool,

    /// Number of jobs in the server queue
    pub pending_jobs: u64,

    /// Status message ("active", "maintenance", "internal", ...)
    pub status_msg: String,
}

/// Device properties (calibration data), as sent by the server.
///
/// Timestamps are UTC on the wire; `qlink_backend` converts them to local
/// time and indexes the parameter tables when it decodes this into its
/// `BackendProperties` type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProperties {
    /// Backend name
    pub backend_name: String,

    /// Backend version
    pub backend_version: Option<String>,

    /// Calibration timestamp
    pub last_update_date: DateTime<Utc>,

    /// Per-qubit parameter lists (T1, T2, frequency, readout_error, ...)
    pub qubits: Vec<Vec<ParameterValue>>,

    /// Per-gate parameter lists (gate_error, gate_length, ...)
    pub gates: Vec<GateProperties>,

    /// Device-wide parameters
    #[serde(default)]
    pub general: Vec<ParameterValue>,
}

/// A named, dated, unit-qualified measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterValue {
    /// Parameter name
    pub name: String,

    /// Parameter value
    pub value: f64,

    /// Unit ("us", "ns", "GHz", ...), empty for dimensionless values
    pub unit: Option<String>,

    /// When the parameter was measured
    pub date: Option<DateTime<Utc>>,
}

/// Calibration data for one gate on one qubit tuple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateProperties {
    /// Gate name
    pub gate: String,

    /// Qubits the gate acts on
    pub qubits: Vec<usize>,

    /// Gate parameters
    pub parameters: Vec<ParameterValue>,
}

/// Pulse defaults, as sent by the server (frequencies in GHz)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDefaults {
    /// Estimated qubit frequencies in GHz
    pub qubit_freq_est: Vec<f64>,

    /// Estimated measurement frequencies in GHz
    pub meas_freq_est: Vec<f64>,

    /// Buffer between pulses in dt cycles
    #[serde(default)]
    pub buffer: Option<u64>,
}

/// Per-account job limit for a backend.
///
/// `maximum_jobs == -1` means the backend imposes no limit; the backend
/// layer maps that sentinel to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLimitResponse {
    /// Maximum number of concurrent active jobs (-1 = unlimited)
    pub maximum_jobs: i64,

    /// Current number of active jobs
    pub active_jobs: i64,
}

/// Reservations list response
#[derive(Debug, Clone, Deserialize)]
struct ReservationsResponse {
    /// List of reservations
    reservations: Vec<ReservationResponse>,
}

/// One backend reservation, as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    /// Reservation start (UTC)
    pub start_datetime: DateTime<Utc>,

    /// Reservation end (UTC)
    pub end_datetime: DateTime<Utc>,

    /// Scheduling mode, only visible to the reservation owner
    pub mode: Option<String>,

    /// Reservation id, only visible to the reservation owner
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_deserialize() {
        let json = r#"{
            "backend_name": "qlink_osprey",
            "backend_version": "1.4.2",
            "n_qubits": 27,
            "basis_gates": ["id", "rz", "sx", "x", "cx"],
            "supported_instructions": ["cx", "delay", "id", "measure", "rz", "sx", "x"],
            "simulator": false,
            "memory": true,
            "max_shots": 100000,
            "max_experiments": 300,
            "dt": 2.2222222222222221e-10,
            "rep_times": [0.001],
            "default_rep_delay": 0.00025,
            "rep_delay_range": [0.0, 0.0005],
            "dynamic_reprate_enabled": true,
            "measure_esp_enabled": true
        }"#;

        let config: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(config.backend_name, "qlink_osprey");
        assert_eq!(config.n_qubits, 27);
        assert_eq!(config.max_experiments, Some(300));
        assert!(config.supports_instruction("delay"));
        assert!(!config.supports_instruction("ecr"));
        assert!(config.measure_esp_enabled);
    }

    #[test]
    fn test_configuration_missing_required_field_fails() {
        // n_qubits absent: protocol error, not a partial result
        let json = r#"{
            "backend_name": "qlink_osprey",
            "backend_version": "1.4.2",
            "basis_gates": [],
            "max_shots": 4000
        }"#;
        assert!(serde_json::from_str::<Configuration>(json).is_err());
    }

    #[test]
    fn test_status_deserialize_strict() {
        let json = r#"{
            "backend_name": "qlink_osprey",
            "backend_version": "1.4.2",
            "operational": true,
            "pending_jobs": 17,
            "status_msg": "active"
        }"#;

        let status: BackendStatus = serde_json::from_str(json).unwrap();
        assert!(status.operational);
        assert_eq!(status.pending_jobs, 17);

        // Missing status_msg is a shape violation
        let incomplete = r#"{
            "backend_name": "qlink_osprey",
            "backend_version": "1.4.2",
            "operational": true,
            "pending_jobs": 17
        }"#;
        assert!(serde_json::from_str::<BackendStatus>(incomplete).is_err());
    }

    #[test]
    fn test_properties_deserialize() {
        let json = r#"{
            "backend_name": "qlink_osprey",
            "backend_version": "1.4.2",
            "last_update_date": "2024-06-01T03:11:00Z",
            "qubits": [[
                {"name": "T1", "value": 112.5, "unit": "us", "date": "2024-06-01T03:10:00Z"},
                {"name": "T2", "value": 80.1, "unit": "us", "date": "2024-06-01T03:10:00Z"},
                {"name": "readout_error", "value": 0.011, "unit": "", "date": null}
            ]],
            "gates": [{
                "gate": "sx",
                "qubits": [0],
                "parameters": [
                    {"name": "gate_error", "value": 0.0002, "unit": "", "date": null},
                    {"name": "gate_length", "value": 35.5, "unit": "ns", "date": null}
                ]
            }]
        }"#;

        let props: DeviceProperties = serde_json::from_str(json).unwrap();
        assert_eq!(props.qubits.len(), 1);
        assert_eq!(props.gates[0].gate, "sx");
    }

    #[test]
    fn test_job_limit_deserialize() {
        let json = r#"{"maximum_jobs": 5, "active_jobs": 2}"#;
        let limit: JobLimitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(limit.maximum_jobs, 5);
        assert_eq!(limit.active_jobs, 2);

        // Missing active_jobs is a shape violation
        assert!(serde_json::from_str::<JobLimitResponse>(r#"{"maximum_jobs": 5}"#).is_err());
    }

    #[test]
    fn test_error_body_parse() {
        let json = r#"{"error": {"code": 3458, "message": "Max number of concurrent jobs reached"}}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.code, Some(3458));
    }

    #[test]
    fn test_backend_overview_aliases() {
        let json = r#"{"name": "qlink_sim", "num_qubits": 32, "simulator": true}"#;
        let overview: BackendOverview = serde_json::from_str(json).unwrap();
        assert_eq!(overview.num_qubits, Some(32));
        assert!(overview.simulator);
        assert!(!overview.operational);
    }

    #[test]
    fn test_client_debug_redacts_token() {
        let creds = Credentials::new("a".repeat(48));
        let client = ApiClient::new(creds).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("aaaa"));
    }
}
