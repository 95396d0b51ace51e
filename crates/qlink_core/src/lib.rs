//! # QLink Core
//!
//! Circuit and pulse-schedule data model for the QLink SDK.
//!
//! This crate defines the units of work the SDK submits to the QLink cloud
//! service: gate-level [`Circuit`]s, pulse-level [`PulseSchedule`]s and the
//! [`Program`] union over both. It carries no backend or network logic.
//!
//! ## Quick Start
//!
//! ```rust
//! use qlink_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(3)
//!     .h(0)
//!     .cx(0, 1)
//!     .cx(1, 2)
//!     .measure_all()
//!     .build();
//!
//! assert_eq!(circuit.num_qubits(), 3);
//! assert_eq!(circuit.depth(), 4);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Error types
pub mod error;

/// Circuit instructions
pub mod instruction;

/// Circuit structure
pub mod circuit;

/// Circuit builder
pub mod builder;

/// Pulse schedules
pub mod schedule;

/// Submission program union
pub mod program;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use error::{QlinkError, QlinkResult};
pub use instruction::{Angle, Instruction, QubitId};
pub use program::Program;
pub use schedule::{PulseInstruction, PulseInstructionKind, PulseSchedule};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qlink_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::error::{QlinkError, QlinkResult};
    pub use crate::instruction::{Angle, Instruction, QubitId};
    pub use crate::program::Program;
    pub use crate::schedule::PulseSchedule;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_circuit_roundtrip() {
        let circuit = CircuitBuilder::with_name(2, "bell")
            .h(0)
            .cx(0, 1)
            .measure_all()
            .build();

        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(circuit, back);
    }

    #[test]
    fn test_program_batch() {
        let programs: Vec<Program> = (0..4)
            .map(|i| {
                CircuitBuilder::with_name(2, format!("circuit_{}", i))
                    .h(0)
                    .cx(0, 1)
                    .build()
                    .into()
            })
            .collect();

        assert!(programs.iter().all(|p| p.is_circuit()));
        assert_eq!(programs[2].name(), Some("circuit_2"));
    }

    #[test]
    fn test_id_scan_and_rewrite() {
        // The rewrite backends perform: id -> delay, in place
        let mut circuit = CircuitBuilder::new(2).h(0).id(1).build();
        assert!(circuit.contains_instruction("id"));

        for instruction in circuit.instructions_mut() {
            if let Instruction::Id(q) = *instruction {
                *instruction = Instruction::Delay(q, 160);
            }
        }

        assert!(!circuit.contains_instruction("id"));
        assert!(circuit.contains_instruction("delay"));
    }
}
