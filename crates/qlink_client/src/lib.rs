//! # QLink Client
//!
//! Account credentials and REST API client for the QLink quantum cloud
//! service.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qlink_client::prelude::*;
//!
//! // Auto-detect credentials (env vars, then ~/.qlink/credentials.json)
//! let credentials = Credentials::auto_load()?;
//! let client = ApiClient::new(credentials)?;
//!
//! let backends = client.list_backends().await?;
//! for backend in backends {
//!     println!("{} ({} qubits)", backend.name, backend.num_qubits.unwrap_or(0));
//! }
//! ```
//!
//! ## Environment Variables
//!
//! ```bash
//! export QLINK_TOKEN="your-api-token"
//! export QLINK_URL="https://api.quantum.qlink.io/v1"   # Optional
//! export QLINK_INSTANCE="hub/group/project"            # Optional
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Account credentials and discovery
pub mod credentials;

/// REST API client and wire types
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{
    ApiClient, BackendOverview, BackendStatus, ClientError, Configuration, DeviceDefaults,
    DeviceProperties, GateProperties, JobLimitResponse, ParameterValue, ReservationResponse,
};
pub use credentials::{AuthError, Credentials, Instance, DEFAULT_API_URL};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qlink_client::prelude::*;
    //! ```

    pub use crate::client::{ApiClient, BackendStatus, ClientError, Configuration};
    pub use crate::credentials::{AuthError, Credentials, Instance};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_client_from_credentials() {
        let credentials = Credentials::new("t".repeat(40));
        let client = ApiClient::new(credentials).unwrap();
        assert!(client.base_url().starts_with("https://"));
    }

    #[test]
    fn test_invalid_credentials_rejected() {
        let credentials = Credentials::new("short");
        assert!(matches!(
            ApiClient::new(credentials),
            Err(ClientError::Auth(AuthError::InvalidTokenFormat))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let credentials =
            Credentials::new("t".repeat(40)).with_url("https://api.quantum.qlink.io/v1/");
        let client = ApiClient::new(credentials).unwrap();
        assert_eq!(client.base_url(), "https://api.quantum.qlink.io/v1");
    }
}
