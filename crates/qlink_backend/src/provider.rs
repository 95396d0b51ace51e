//! Provider entry point for a QLink account.
//!
//! A [`Provider`] authenticates once and hands out backend objects. The
//! variant is chosen from the backend's own descriptor: simulators become
//! [`SimulatorBackend`]s, everything else an [`ActiveBackend`], and names
//! the service no longer lists come back as [`RetiredBackend`]s so old job
//! references keep resolving.

use crate::backend::{
    client_err, ActiveBackend, BackendError, QuantumBackend, RetiredBackend, SimulatorBackend,
};
use crate::events::EventBus;
use crate::job::{CircuitJob, JobResponse};
use qlink_client::{ApiClient, BackendOverview, ClientError, Configuration, Credentials};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Access point to the backends and jobs of one QLink account
pub struct Provider {
    client: ApiClient,
    runtime: Arc<Runtime>,
    events: EventBus,
}

impl Provider {
    /// Authenticate with explicit credentials
    pub fn new(credentials: Credentials) -> Result<Self, BackendError> {
        let runtime =
            Arc::new(Runtime::new().map_err(|e| BackendError::Runtime(e.to_string()))?);
        let client = ApiClient::new(credentials).map_err(client_err)?;
        Ok(Self {
            client,
            runtime,
            events: EventBus::new(),
        })
    }

    /// Authenticate from environment variables
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(Credentials::from_env()?)
    }

    /// Authenticate from any discovered credential source (env vars, then
    /// ~/.qlink/credentials.json)
    pub fn auto_load() -> Result<Self, BackendError> {
        Self::new(Credentials::auto_load()?)
    }

    /// The submission event bus shared by every backend this provider
    /// constructs
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Raw backend listing, without constructing backend objects
    pub fn overviews(&self) -> Result<Vec<BackendOverview>, BackendError> {
        let client = self.client.clone();
        self.runtime
            .block_on(async move { client.list_backends().await })
            .map_err(client_err)
    }

    /// All backends visible to this account.
    ///
    /// One configuration round-trip per backend; entries whose
    /// configuration can no longer be fetched are skipped with a warning.
    pub fn backends(&self) -> Result<Vec<Box<dyn QuantumBackend>>, BackendError> {
        let overviews = self.overviews()?;
        let mut backends: Vec<Box<dyn QuantumBackend>> = Vec::with_capacity(overviews.len());

        for overview in overviews {
            match self.fetch_configuration(&overview.name) {
                Ok(configuration) => backends.push(self.make_backend(configuration)),
                Err(err) => {
                    log::warn!(
                        "Skipping backend {}: could not fetch configuration ({})",
                        overview.name,
                        err
                    );
                }
            }
        }

        Ok(backends)
    }

    /// A single backend by name.
    ///
    /// Names the service no longer lists resolve to a [`RetiredBackend`].
    pub fn backend(&self, name: &str) -> Result<Box<dyn QuantumBackend>, BackendError> {
        match self.fetch_configuration(name) {
            Ok(configuration) => Ok(self.make_backend(configuration)),
            Err(BackendError::Client(ClientError::Api { status: 404, .. })) => {
                log::warn!("Backend {} is no longer available; returning a retired handle", name);
                Ok(Box::new(RetiredBackend::from_name(name)))
            }
            Err(err) => Err(err),
        }
    }

    /// The operational hardware backend with the shortest queue among those
    /// with at least `min_qubits` qubits
    pub fn least_busy(&self, min_qubits: usize) -> Result<Box<dyn QuantumBackend>, BackendError> {
        let candidates: Vec<BackendOverview> = self
            .overviews()?
            .into_iter()
            .filter(|b| {
                b.operational && !b.simulator && b.num_qubits.unwrap_or(0) >= min_qubits
            })
            .collect();

        let mut best: Option<(String, u64)> = None;
        for candidate in candidates {
            let client = self.client.clone();
            let name = candidate.name.clone();
            let status = self
                .runtime
                .block_on(async move { client.backend_status(&name).await })
                .map_err(client_err)?;
            if status.operational
                && best
                    .as_ref()
                    .map(|(_, pending)| status.pending_jobs < *pending)
                    .unwrap_or(true)
            {
                best = Some((candidate.name, status.pending_jobs));
            }
        }

        match best {
            Some((name, _)) => self.backend(&name),
            None => Err(BackendError::Validation(format!(
                "No operational backend with at least {} qubits available",
                min_qubits
            ))),
        }
    }

    /// Re-attach a handle to an existing job by id
    pub fn job(&self, job_id: &str) -> Result<CircuitJob, BackendError> {
        let client = self.client.clone();
        let path = format!("/jobs/{}", job_id);
        let response: JobResponse = self
            .runtime
            .block_on(async move { client.get(&path).await })
            .map_err(client_err)?;
        Ok(CircuitJob::from_response(response, self.client.clone()))
    }

    fn fetch_configuration(&self, name: &str) -> Result<Configuration, BackendError> {
        let client = self.client.clone();
        let name = name.to_string();
        self.runtime
            .block_on(async move { client.backend_configuration(&name).await })
            .map_err(client_err)
    }

    fn make_backend(&self, configuration: Configuration) -> Box<dyn QuantumBackend> {
        let active = ActiveBackend::new(
            configuration,
            self.client.clone(),
            self.runtime.clone(),
            self.events.clone(),
        );
        if active.configuration().simulator {
            Box::new(SimulatorBackend::new(active))
        } else {
            Box::new(active)
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("client", &self.client)
            .finish()
    }
}
