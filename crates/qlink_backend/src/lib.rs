//! # QLink Backend
//!
//! Backend representation, run-request assembly and job tracking for the
//! QLink quantum cloud service.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qlink_backend::prelude::*;
//! use qlink_core::CircuitBuilder;
//!
//! // Auto-detect credentials and pick a backend
//! let provider = Provider::auto_load()?;
//! let mut backend = provider.backend("qlink_osprey")?;
//!
//! // Build and submit a circuit
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
//! let job = backend.run_circuit(circuit, &RunOptions::new().with_shots(4096))?;
//! println!("Submitted job {}", job.id());
//! ```
//!
//! ## Batch Submission and Chunking
//!
//! When a program list exceeds the backend's per-job maximum (or a
//! caller-supplied cap), it is split into contiguous chunks and submitted
//! as one server job per chunk under a [`CompositeJob`]:
//!
//! ```rust,ignore
//! let mut programs: Vec<Program> = circuits.into_iter().map(Into::into).collect();
//! let job = backend.run(&mut programs, &RunOptions::new())?;
//! if let Job::Composite(composite) = job {
//!     println!("{} sub-jobs", composite.jobs().len());
//! }
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Run configuration and per-call options
pub mod options;

/// Program encoding for job payloads
pub mod encode;

/// Run-request assembly: validation, rewriting, chunking
pub mod assembler;

/// Decoded device properties
pub mod properties;

/// Decoded pulse defaults
pub mod defaults;

/// Job limits and reservations
pub mod reservation;

/// Job handles and job wire types
pub mod job;

/// Submission notification hook
pub mod events;

/// Backend variants and the blocking facade
pub mod backend;

/// Provider entry point
pub mod provider;

// ============================================================================
// Re-exports
// ============================================================================

pub use assembler::{assemble, Assembly, JobPayload, PayloadProgram};
pub use backend::{
    ActiveBackend, BackendError, QuantumBackend, RetiredBackend, SimulatorBackend,
};
pub use defaults::PulseDefaults;
pub use events::{EventBus, JobEvent};
pub use job::{CircuitJob, CompositeJob, Job, JobError, JobResult, JobStatus, ProgramResult};
pub use options::{MeasLevel, MeasReturn, RunConfig, RunOptions};
pub use properties::BackendProperties;
pub use provider::Provider;
pub use reservation::{JobLimit, Reservation};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qlink_backend::prelude::*;
    //! ```

    pub use crate::backend::{
        ActiveBackend, BackendError, QuantumBackend, RetiredBackend, SimulatorBackend,
    };
    pub use crate::job::{CircuitJob, CompositeJob, Job, JobStatus};
    pub use crate::options::{MeasLevel, MeasReturn, RunOptions};
    pub use crate::provider::Provider;
}

// ============================================================================
// Test Fixtures
// ============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use crate::properties::BackendProperties;
    use qlink_client::{ApiClient, Configuration, Credentials, DeviceProperties};

    /// A client that validates but never reaches the network in tests
    pub(crate) fn test_client() -> ApiClient {
        ApiClient::new(Credentials::new("t".repeat(40))).unwrap()
    }

    /// A 27-qubit hardware backend with a low chunking threshold
    pub(crate) fn hardware_config() -> Configuration {
        Configuration {
            backend_name: "qlink_osprey".to_string(),
            backend_version: "1.4.2".to_string(),
            n_qubits: 27,
            basis_gates: vec![
                "id".to_string(),
                "rz".to_string(),
                "sx".to_string(),
                "x".to_string(),
                "cx".to_string(),
            ],
            supported_instructions: vec![
                "cx".to_string(),
                "delay".to_string(),
                "id".to_string(),
                "measure".to_string(),
                "rz".to_string(),
                "sx".to_string(),
                "x".to_string(),
            ],
            simulator: false,
            memory: true,
            max_shots: 8192,
            max_experiments: Some(3),
            dt: Some(2.2222222222222221e-10),
            rep_times: vec![0.001],
            default_rep_delay: Some(0.00025),
            rep_delay_range: Some([0.0, 0.0005]),
            dynamic_reprate_enabled: true,
            measure_esp_enabled: false,
            open_pulse: true,
            simulation_method: None,
            coupling_map: None,
            description: None,
        }
    }

    /// A simulator backend declaring a simulation method
    pub(crate) fn simulator_config() -> Configuration {
        Configuration {
            backend_name: "qlink_sim".to_string(),
            backend_version: "2.0.0".to_string(),
            n_qubits: 32,
            basis_gates: Vec::new(),
            supported_instructions: Vec::new(),
            simulator: true,
            memory: true,
            max_shots: 100_000,
            max_experiments: None,
            dt: None,
            rep_times: Vec::new(),
            default_rep_delay: None,
            rep_delay_range: None,
            dynamic_reprate_enabled: false,
            measure_esp_enabled: false,
            open_pulse: false,
            simulation_method: Some("statevector".to_string()),
            coupling_map: None,
            description: None,
        }
    }

    /// Properties matching `hardware_config`, with a 35.5 ns sx gate
    pub(crate) fn hardware_properties() -> BackendProperties {
        let api: DeviceProperties = serde_json::from_str(
            r#"{
                "backend_name": "qlink_osprey",
                "backend_version": "1.4.2",
                "last_update_date": "2024-06-01T03:11:00Z",
                "qubits": [
                    [
                        {"name": "T1", "value": 112.5, "unit": "us", "date": null},
                        {"name": "T2", "value": 80.1, "unit": "us", "date": null}
                    ],
                    [
                        {"name": "T1", "value": 98.0, "unit": "us", "date": null}
                    ]
                ],
                "gates": [
                    {
                        "gate": "sx",
                        "qubits": [0],
                        "parameters": [
                            {"name": "gate_length", "value": 35.5, "unit": "ns", "date": null}
                        ]
                    },
                    {
                        "gate": "sx",
                        "qubits": [1],
                        "parameters": [
                            {"name": "gate_length", "value": 35.5, "unit": "ns", "date": null}
                        ]
                    }
                ],
                "general": []
            }"#,
        )
        .unwrap();
        BackendProperties::from_api(api)
    }
}

// ============================================================================
// Integration Tests
// ============================================================================
