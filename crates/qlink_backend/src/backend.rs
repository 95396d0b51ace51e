//! Backend variants and the blocking facade.
//!
//! A backend object represents one named remote compute target. Three
//! variants implement the same operation set:
//!
//! - [`ActiveBackend`] - the full behavior: run-request assembly, job
//!   submission, metadata accessors with the two descriptor caches.
//! - [`SimulatorBackend`] - wraps an active backend; simulators publish no
//!   device properties and skip the unknown-option warning.
//! - [`RetiredBackend`] - a device the service no longer lists; every
//!   operation returns a fixed answer and `run` fails.
//!
//! The facade is synchronous: each backend owns a tokio runtime and blocks
//! on the async client per call. Callers are expected to drive a backend
//! from one thread at a time; the caches are plain fields, not
//! synchronized.

use crate::assembler;
use crate::defaults::PulseDefaults;
use crate::events::{EventBus, JobEvent};
use crate::job::{
    CircuitJob, CompositeJob, Job, JobError, JobsListResponse, SubmitResponse,
};
use crate::options::RunOptions;
use crate::properties::BackendProperties;
use crate::reservation::{JobLimit, Reservation};
use chrono::{DateTime, Local, Utc};
use qlink_client::{
    ApiClient, AuthError, BackendStatus, ClientError, Configuration, Credentials,
};
use qlink_core::{Circuit, Program};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Runtime;

/// Server error code reported when the account's job limit is reached
const JOB_LIMIT_ERROR_CODE: i64 = 3458;

/// Backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// Invalid argument or unsupported feature, raised before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// The account's concurrent-job limit is reached
    #[error("Job limit reached: {0}")]
    JobLimitReached(String),

    /// The server rejected the submission at the application level
    #[error("Error submitting job: {0}")]
    Submission(String),

    /// The server response did not match the expected shape
    #[error("Unexpected server response: {0}")]
    Protocol(String),

    /// The backend is retired and no longer accepts work
    #[error("Backend '{0}' is no longer available")]
    Retired(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Transport-level client error
    #[error("Client error: {0}")]
    Client(ClientError),

    /// Job tracking error
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Async runtime error
    #[error("Async runtime error: {0}")]
    Runtime(String),
}

/// Map client failures onto backend errors, surfacing parse failures as
/// protocol errors
pub(crate) fn client_err(err: ClientError) -> BackendError {
    match err {
        ClientError::Parse(e) => BackendError::Protocol(e.to_string()),
        ClientError::Auth(e) => BackendError::Auth(e),
        other => BackendError::Client(other),
    }
}

/// Job submission request body
#[derive(Debug, Serialize)]
struct SubmitRequest {
    backend_name: String,
    payload: assembler::JobPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    experiment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    live_data_enabled: Option<bool>,
}

// ============================================================================
// Operation Set
// ============================================================================

/// The operation set every backend variant implements.
///
/// Metadata accessors perform at most one network round-trip per call.
/// Properties and defaults are cached on the backend object and refreshed
/// only on request; status, job limits and reservations are never cached.
pub trait QuantumBackend {
    /// Backend name (immutable identity)
    fn name(&self) -> &str;

    /// Static backend configuration
    fn configuration(&self) -> &Configuration;

    /// Whether this backend is a simulator
    fn is_simulator(&self) -> bool {
        self.configuration().simulator
    }

    /// Submit programs for execution.
    ///
    /// Circuits may be rewritten in place (deprecated-instruction
    /// substitution). When the program count exceeds the backend's
    /// per-job maximum the list is chunked and a composite job is
    /// returned.
    fn run(&mut self, programs: &mut [Program], options: &RunOptions)
        -> Result<Job, BackendError>;

    /// Convenience wrapper to submit a single circuit
    fn run_circuit(
        &mut self,
        circuit: Circuit,
        options: &RunOptions,
    ) -> Result<Job, BackendError> {
        let mut programs = [Program::Circuit(circuit)];
        self.run(&mut programs, options)
    }

    /// Device properties (calibration data), cached.
    ///
    /// Returns `None` for backends that publish no properties.
    fn properties(&mut self, refresh: bool)
        -> Result<Option<&BackendProperties>, BackendError>;

    /// Historical device properties: the snapshot closest to, but older
    /// than, the given time. Bypasses the cache and is never stored.
    fn properties_at(
        &self,
        at: DateTime<Local>,
    ) -> Result<Option<BackendProperties>, BackendError>;

    /// Live backend status, never cached
    fn status(&self) -> Result<BackendStatus, BackendError>;

    /// Pulse defaults, cached. `None` when the backend has no pulse access.
    fn defaults(&mut self, refresh: bool) -> Result<Option<&PulseDefaults>, BackendError>;

    /// Per-account job limit; `None` when the backend imposes none
    fn job_limit(&self) -> Result<Option<JobLimit>, BackendError>;

    /// Jobs that can still be submitted before hitting the limit
    fn remaining_jobs_count(&self) -> Result<Option<i64>, BackendError> {
        Ok(self.job_limit()?.and_then(|limit| limit.remaining()))
    }

    /// Reservations overlapping the given window (local time)
    fn reservations(
        &self,
        start: Option<DateTime<Local>>,
        end: Option<DateTime<Local>>,
    ) -> Result<Vec<Reservation>, BackendError>;

    /// This account's unfinished jobs on the backend
    fn active_jobs(&self, limit: usize) -> Result<Vec<CircuitJob>, BackendError>;
}

// ============================================================================
// Active Backend
// ============================================================================

/// Shared state of the network-backed variants
struct BackendCore {
    configuration: Configuration,
    client: ApiClient,
    runtime: Arc<Runtime>,
    events: EventBus,

    // Descriptor caches, refreshed on demand only
    properties: Option<BackendProperties>,
    defaults: Option<PulseDefaults>,

    // Deprecation warning is per backend instance
    id_warning_issued: bool,
}

/// A live hardware (or hardware-like) backend
pub struct ActiveBackend {
    core: BackendCore,
}

impl ActiveBackend {
    /// Build from an already-fetched configuration (used by the provider)
    pub fn new(
        configuration: Configuration,
        client: ApiClient,
        runtime: Arc<Runtime>,
        events: EventBus,
    ) -> Self {
        Self {
            core: BackendCore {
                configuration,
                client,
                runtime,
                events,
                properties: None,
                defaults: None,
                id_warning_issued: false,
            },
        }
    }

    /// Create a backend by name, fetching its configuration
    pub fn from_name(name: &str, credentials: Credentials) -> Result<Self, BackendError> {
        let runtime =
            Arc::new(Runtime::new().map_err(|e| BackendError::Runtime(e.to_string()))?);
        let client = ApiClient::new(credentials).map_err(client_err)?;

        let configuration = {
            let client = client.clone();
            let name = name.to_string();
            runtime
                .block_on(async move { client.backend_configuration(&name).await })
                .map_err(client_err)?
        };

        Ok(Self::new(configuration, client, runtime, EventBus::new()))
    }

    /// The submission event bus for this backend
    pub fn events(&self) -> &EventBus {
        &self.core.events
    }

    fn fetch_properties(
        &self,
        updated_before: Option<DateTime<Utc>>,
    ) -> Result<Option<BackendProperties>, BackendError> {
        let client = self.core.client.clone();
        let name = self.core.configuration.backend_name.clone();
        let api = self
            .core
            .runtime
            .block_on(async move { client.backend_properties(&name, updated_before).await })
            .map_err(client_err)?;
        Ok(api.map(BackendProperties::from_api))
    }

    /// Shared run path. `warn_unknown` is false on the simulator variant.
    fn run_inner(
        &mut self,
        programs: &mut [Program],
        options: &RunOptions,
        warn_unknown: bool,
    ) -> Result<Job, BackendError> {
        // Fail fast: everything validated before any network traffic
        assembler::validate(programs, &self.core.configuration, options)?;

        // Deprecated-instruction rewrite on hardware backends. The rewrite
        // needs the sx gate length, so properties are fetched here when not
        // already cached.
        if !self.core.configuration.simulator
            && self.core.configuration.supports_instruction("delay")
        {
            let has_id = programs
                .iter()
                .filter_map(|p| p.as_circuit())
                .any(|c| c.contains_instruction("id"));
            if has_id {
                if self.core.properties.is_none() {
                    self.core.properties = self.fetch_properties(None)?;
                }
                assembler::substitute_id_instructions(
                    programs,
                    &self.core.configuration,
                    self.core.properties.as_ref(),
                    &mut self.core.id_warning_issued,
                );
            }
        }

        let assembly = assembler::assemble(programs, &self.core.configuration, options)?;

        if warn_unknown {
            for key in &assembly.unknown_options {
                log::warn!(
                    "{} is not a recognized run option and may be ignored by the backend.",
                    key
                );
            }
        }

        if !assembly.is_chunked() {
            let payload = assembly.payloads.into_iter().next().expect("one payload");
            let job = self.submit_payload(
                payload,
                options.job_name.clone(),
                options.job_tags.clone(),
                None,
                options.live_data_enabled,
            )?;
            return Ok(Job::Circuit(job));
        }

        // Oversized program list: one server job per chunk, aggregated
        // under a client-side composite id carried as experiment_id and as
        // a reserved tag on every sub-job.
        let composite_id = assembler::composite_job_id();
        let mut sub_tags = options.job_tags.clone();
        sub_tags.push(composite_id.clone());

        let total = assembly.payloads.len();
        let mut jobs = Vec::with_capacity(total);
        for (index, payload) in assembly.payloads.into_iter().enumerate() {
            let name = options
                .job_name
                .as_ref()
                .map(|n| format!("{}_{}", n, index));
            let job = self.submit_payload(
                payload,
                name,
                sub_tags.clone(),
                Some(composite_id.clone()),
                options.live_data_enabled,
            )?;
            jobs.push(job);
        }
        log::debug!(
            "Composite job {} submitted as {} sub-jobs.",
            composite_id,
            total
        );

        Ok(Job::Composite(CompositeJob::new(
            composite_id,
            self.core.configuration.backend_name.clone(),
            jobs,
            options.job_name.clone(),
            options.job_tags.clone(),
        )))
    }

    /// Submit one payload and interpret the response
    fn submit_payload(
        &self,
        payload: assembler::JobPayload,
        name: Option<String>,
        tags: Vec<String>,
        experiment_id: Option<String>,
        live_data_enabled: Option<bool>,
    ) -> Result<CircuitJob, BackendError> {
        let backend_name = self.core.configuration.backend_name.clone();
        let request = SubmitRequest {
            backend_name: backend_name.clone(),
            payload,
            name: name.clone(),
            tags: tags.clone(),
            experiment_id: experiment_id.clone(),
            live_data_enabled,
        };

        let client = self.core.client.clone();
        let response: SubmitResponse = self
            .core
            .runtime
            .block_on(async move { client.post("/jobs", &request).await })
            .map_err(|err| match err {
                ClientError::Api {
                    code: Some(JOB_LIMIT_ERROR_CODE),
                    message,
                    ..
                } => BackendError::JobLimitReached(message),
                other => client_err(other),
            })?;

        let job = CircuitJob::from_submission(
            response,
            self.core.client.clone(),
            &backend_name,
            name,
            tags,
        )
        .map_err(|err| match err {
            JobError::SubmissionFailed(msg) => BackendError::Submission(msg),
            JobError::Protocol(msg) => BackendError::Protocol(msg),
            other => BackendError::Job(other),
        })?;

        log::debug!("Job {} was successfully submitted.", job.id());
        self.core.events.publish(&JobEvent {
            job_id: job.id().to_string(),
            backend_name,
            composite_id: experiment_id,
        });

        Ok(job)
    }
}

impl QuantumBackend for ActiveBackend {
    fn name(&self) -> &str {
        &self.core.configuration.backend_name
    }

    fn configuration(&self) -> &Configuration {
        &self.core.configuration
    }

    fn run(
        &mut self,
        programs: &mut [Program],
        options: &RunOptions,
    ) -> Result<Job, BackendError> {
        self.run_inner(programs, options, true)
    }

    fn properties(
        &mut self,
        refresh: bool,
    ) -> Result<Option<&BackendProperties>, BackendError> {
        if refresh || self.core.properties.is_none() {
            self.core.properties = self.fetch_properties(None)?;
        }
        Ok(self.core.properties.as_ref())
    }

    fn properties_at(
        &self,
        at: DateTime<Local>,
    ) -> Result<Option<BackendProperties>, BackendError> {
        // Historical snapshots bypass the cache and are never stored
        self.fetch_properties(Some(at.with_timezone(&Utc)))
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        let client = self.core.client.clone();
        let name = self.core.configuration.backend_name.clone();
        self.core
            .runtime
            .block_on(async move { client.backend_status(&name).await })
            .map_err(client_err)
    }

    fn defaults(&mut self, refresh: bool) -> Result<Option<&PulseDefaults>, BackendError> {
        if refresh || self.core.defaults.is_none() {
            let client = self.core.client.clone();
            let name = self.core.configuration.backend_name.clone();
            let api = self
                .core
                .runtime
                .block_on(async move { client.backend_defaults(&name).await })
                .map_err(client_err)?;
            self.core.defaults = api.map(PulseDefaults::from_api);
        }
        Ok(self.core.defaults.as_ref())
    }

    fn job_limit(&self) -> Result<Option<JobLimit>, BackendError> {
        let client = self.core.client.clone();
        let name = self.core.configuration.backend_name.clone();
        let api = self
            .core
            .runtime
            .block_on(async move { client.backend_job_limit(&name).await })
            .map_err(client_err)?;
        Ok(Some(JobLimit::from_api(api)))
    }

    fn reservations(
        &self,
        start: Option<DateTime<Local>>,
        end: Option<DateTime<Local>>,
    ) -> Result<Vec<Reservation>, BackendError> {
        let client = self.core.client.clone();
        let name = self.core.configuration.backend_name.clone();
        let start = start.map(|t| t.with_timezone(&Utc));
        let end = end.map(|t| t.with_timezone(&Utc));
        let api = self
            .core
            .runtime
            .block_on(async move { client.backend_reservations(&name, start, end).await })
            .map_err(client_err)?;
        Ok(api.into_iter().map(Reservation::from_api).collect())
    }

    fn active_jobs(&self, limit: usize) -> Result<Vec<CircuitJob>, BackendError> {
        let client = self.core.client.clone();
        let path = format!(
            "/jobs?backend={}&limit={}",
            self.core.configuration.backend_name, limit
        );
        let response: JobsListResponse = self
            .core
            .runtime
            .block_on(async move { client.get(&path).await })
            .map_err(client_err)?;

        Ok(response
            .jobs
            .into_iter()
            .filter(|job| job.status.map(|s| s.is_active()).unwrap_or(true))
            .map(|job| CircuitJob::from_response(job, self.core.client.clone()))
            .collect())
    }
}

// ============================================================================
// Simulator Backend
// ============================================================================

/// A simulator backend.
///
/// Simulators publish no device properties, inject their declared
/// simulation method into the run config, and accept arbitrary run options
/// without the pass-through warning.
pub struct SimulatorBackend {
    inner: ActiveBackend,
}

impl SimulatorBackend {
    /// Wrap an active backend whose configuration declares a simulator
    pub fn new(inner: ActiveBackend) -> Self {
        Self { inner }
    }

    /// Create a simulator backend by name, fetching its configuration
    pub fn from_name(name: &str, credentials: Credentials) -> Result<Self, BackendError> {
        Ok(Self {
            inner: ActiveBackend::from_name(name, credentials)?,
        })
    }

    /// The submission event bus for this backend
    pub fn events(&self) -> &EventBus {
        self.inner.events()
    }
}

impl QuantumBackend for SimulatorBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn configuration(&self) -> &Configuration {
        self.inner.configuration()
    }

    fn run(
        &mut self,
        programs: &mut [Program],
        options: &RunOptions,
    ) -> Result<Job, BackendError> {
        // Simulators accept open-ended option sets; no pass-through warning
        self.inner.run_inner(programs, options, false)
    }

    fn properties(
        &mut self,
        _refresh: bool,
    ) -> Result<Option<&BackendProperties>, BackendError> {
        // Simulators have no device properties
        Ok(None)
    }

    fn properties_at(
        &self,
        _at: DateTime<Local>,
    ) -> Result<Option<BackendProperties>, BackendError> {
        Ok(None)
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        self.inner.status()
    }

    fn defaults(&mut self, refresh: bool) -> Result<Option<&PulseDefaults>, BackendError> {
        self.inner.defaults(refresh)
    }

    fn job_limit(&self) -> Result<Option<JobLimit>, BackendError> {
        self.inner.job_limit()
    }

    fn reservations(
        &self,
        start: Option<DateTime<Local>>,
        end: Option<DateTime<Local>>,
    ) -> Result<Vec<Reservation>, BackendError> {
        self.inner.reservations(start, end)
    }

    fn active_jobs(&self, limit: usize) -> Result<Vec<CircuitJob>, BackendError> {
        self.inner.active_jobs(limit)
    }
}

// ============================================================================
// Retired Backend
// ============================================================================

/// A backend the service no longer offers.
///
/// Every operation answers locally: the fixed status was captured at
/// construction, metadata accessors return empty answers, and `run` fails.
pub struct RetiredBackend {
    configuration: Configuration,
    status: BackendStatus,
}

impl RetiredBackend {
    /// Wrap the last known configuration of a retired device
    pub fn new(configuration: Configuration) -> Self {
        let status = BackendStatus {
            backend_name: configuration.backend_name.clone(),
            backend_version: configuration.backend_version.clone(),
            operational: false,
            pending_jobs: 0,
            status_msg: "This backend is no longer available.".to_string(),
        };
        Self {
            configuration,
            status,
        }
    }

    /// Build a retired backend from a bare name with a placeholder
    /// configuration
    pub fn from_name(name: &str) -> Self {
        Self::new(Configuration {
            backend_name: name.to_string(),
            backend_version: "0.0.0".to_string(),
            n_qubits: 1,
            basis_gates: Vec::new(),
            supported_instructions: Vec::new(),
            simulator: false,
            memory: false,
            max_shots: 1,
            max_experiments: None,
            dt: None,
            rep_times: Vec::new(),
            default_rep_delay: None,
            rep_delay_range: None,
            dynamic_reprate_enabled: false,
            measure_esp_enabled: false,
            open_pulse: false,
            simulation_method: None,
            coupling_map: None,
            description: None,
        })
    }
}

impl QuantumBackend for RetiredBackend {
    fn name(&self) -> &str {
        &self.configuration.backend_name
    }

    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn run(
        &mut self,
        _programs: &mut [Program],
        _options: &RunOptions,
    ) -> Result<Job, BackendError> {
        Err(BackendError::Retired(
            self.configuration.backend_name.clone(),
        ))
    }

    fn properties(
        &mut self,
        _refresh: bool,
    ) -> Result<Option<&BackendProperties>, BackendError> {
        Ok(None)
    }

    fn properties_at(
        &self,
        _at: DateTime<Local>,
    ) -> Result<Option<BackendProperties>, BackendError> {
        Ok(None)
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        Ok(self.status.clone())
    }

    fn defaults(&mut self, _refresh: bool) -> Result<Option<&PulseDefaults>, BackendError> {
        Ok(None)
    }

    fn job_limit(&self) -> Result<Option<JobLimit>, BackendError> {
        Ok(None)
    }

    fn reservations(
        &self,
        _start: Option<DateTime<Local>>,
        _end: Option<DateTime<Local>>,
    ) -> Result<Vec<Reservation>, BackendError> {
        Ok(Vec::new())
    }

    fn active_jobs(&self, _limit: usize) -> Result<Vec<CircuitJob>, BackendError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{hardware_config, simulator_config, test_client};
    use qlink_core::CircuitBuilder;

    fn active(configuration: Configuration) -> ActiveBackend {
        ActiveBackend::new(
            configuration,
            test_client(),
            Arc::new(Runtime::new().unwrap()),
            EventBus::new(),
        )
    }

    #[test]
    fn test_retired_backend_answers_locally() {
        let mut backend = RetiredBackend::from_name("qlink_falcon");

        assert_eq!(backend.name(), "qlink_falcon");

        let status = backend.status().unwrap();
        assert!(!status.operational);
        assert_eq!(status.pending_jobs, 0);
        assert!(status.status_msg.contains("no longer available"));

        assert!(backend.properties(true).unwrap().is_none());
        assert!(backend.defaults(true).unwrap().is_none());
        assert!(backend.job_limit().unwrap().is_none());
        assert!(backend.remaining_jobs_count().unwrap().is_none());
        assert!(backend.reservations(None, None).unwrap().is_empty());
        assert!(backend.active_jobs(10).unwrap().is_empty());
    }

    #[test]
    fn test_retired_backend_refuses_to_run() {
        let mut backend = RetiredBackend::from_name("qlink_falcon");
        let mut programs = [Program::Circuit(CircuitBuilder::new(1).h(0).build())];
        let err = backend.run(&mut programs, &RunOptions::new()).unwrap_err();
        assert!(matches!(err, BackendError::Retired(name) if name == "qlink_falcon"));
    }

    #[test]
    fn test_simulator_backend_has_no_properties() {
        let mut backend = SimulatorBackend::new(active(simulator_config()));
        assert!(backend.is_simulator());
        // No network call is made: the override answers immediately
        assert!(backend.properties(true).unwrap().is_none());
        assert!(backend.properties_at(Local::now()).unwrap().is_none());
    }

    #[test]
    fn test_validation_happens_before_any_network_call() {
        // The test client points at an unroutable endpoint; reaching the
        // network would fail, so an immediate Validation error proves the
        // check ran first.
        let mut backend = active(hardware_config());
        let mut programs = [Program::Circuit(CircuitBuilder::new(1).h(0).build())];
        let options = RunOptions::new().with_use_measure_esp(true);
        let err = backend.run(&mut programs, &options).unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));

        let options = RunOptions::new().with_tag("");
        let err = backend.run(&mut programs, &options).unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));
    }

    #[test]
    fn test_trait_objects() {
        let backends: Vec<Box<dyn QuantumBackend>> = vec![
            Box::new(RetiredBackend::from_name("qlink_falcon")),
            Box::new(SimulatorBackend::new(active(simulator_config()))),
        ];
        let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["qlink_falcon", "qlink_sim"]);
    }
}
