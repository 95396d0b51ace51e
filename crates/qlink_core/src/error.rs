//! Error types for the QLink core data model.

use thiserror::Error;

/// Core data-model errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QlinkError {
    /// Instruction references a qubit the circuit does not have
    #[error("Instruction references qubit {qubit} but circuit has only {num_qubits} qubits")]
    QubitOutOfRange {
        /// Offending qubit index
        qubit: usize,
        /// Number of qubits in the circuit
        num_qubits: usize,
    },

    /// Circuit has no instructions
    #[error("Circuit is empty")]
    EmptyCircuit,

    /// Rotation angle is not a finite number
    #[error("Invalid angle {0}: must be finite")]
    InvalidAngle(f64),

    /// Pulse instruction is malformed
    #[error("Invalid pulse instruction: {0}")]
    InvalidPulseInstruction(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for core operations
pub type QlinkResult<T> = Result<T, QlinkError>;

impl From<serde_json::Error> for QlinkError {
    fn from(err: serde_json::Error) -> Self {
        QlinkError::JsonError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QlinkError::QubitOutOfRange {
            qubit: 9,
            num_qubits: 5,
        };
        assert!(err.to_string().contains('9'));
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<u64>("not json").unwrap_err();
        let err: QlinkError = parse_err.into();
        assert!(matches!(err, QlinkError::JsonError(_)));
    }
}
