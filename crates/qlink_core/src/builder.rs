//! Fluent circuit builder.
//!
//! Mirrors the consuming-`self` builder pattern used across the SDK; out of
//! range qubit indices are ignored at build time and caught by backend
//! validation instead.

use crate::circuit::Circuit;
use crate::instruction::{Angle, Instruction, QubitId};

/// Fluent circuit builder (consuming self pattern)
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    /// Create a new circuit builder
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
        }
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::with_name(num_qubits, name),
        }
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::H(qubit));
        self
    }

    /// Add Pauli-X gate
    pub fn x(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::X(qubit));
        self
    }

    /// Add Pauli-Y gate
    pub fn y(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Y(qubit));
        self
    }

    /// Add Pauli-Z gate
    pub fn z(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Z(qubit));
        self
    }

    /// Add S gate
    pub fn s(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::S(qubit));
        self
    }

    /// Add SX gate
    pub fn sx(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Sx(qubit));
        self
    }

    /// Add identity gate
    pub fn id(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Id(qubit));
        self
    }

    /// Add X-rotation
    pub fn rx(mut self, qubit: QubitId, angle: Angle) -> Self {
        let _ = self.circuit.push(Instruction::Rx(qubit, angle));
        self
    }

    /// Add Y-rotation
    pub fn ry(mut self, qubit: QubitId, angle: Angle) -> Self {
        let _ = self.circuit.push(Instruction::Ry(qubit, angle));
        self
    }

    /// Add Z-rotation
    pub fn rz(mut self, qubit: QubitId, angle: Angle) -> Self {
        let _ = self.circuit.push(Instruction::Rz(qubit, angle));
        self
    }

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    pub fn cx(mut self, control: QubitId, target: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Cx(control, target));
        self
    }

    /// Add controlled-Z gate
    pub fn cz(mut self, control: QubitId, target: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Cz(control, target));
        self
    }

    /// Add ECR gate
    pub fn ecr(mut self, a: QubitId, b: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Ecr(a, b));
        self
    }

    // ========================================================================
    // Timing, Measurement and Control
    // ========================================================================

    /// Idle a qubit for `duration` dt cycles
    pub fn delay(mut self, qubit: QubitId, duration: u64) -> Self {
        let _ = self.circuit.push(Instruction::Delay(qubit, duration));
        self
    }

    /// Add barrier over all qubits
    pub fn barrier(mut self) -> Self {
        let _ = self.circuit.push(Instruction::Barrier(Vec::new()));
        self
    }

    /// Measure a single qubit
    pub fn measure(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Measure(qubit));
        self
    }

    /// Measure all qubits
    pub fn measure_all(mut self) -> Self {
        let _ = self.circuit.push(Instruction::MeasureAll);
        self
    }

    /// Reset a qubit
    pub fn reset(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.push(Instruction::Reset(qubit));
        self
    }

    /// Finish building
    pub fn build(self) -> Circuit {
        self.circuit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_circuit() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.count_measurements(), 1);
    }

    #[test]
    fn test_named_builder() {
        let circuit = CircuitBuilder::with_name(3, "ghz")
            .h(0)
            .cx(0, 1)
            .cx(1, 2)
            .build();
        assert_eq!(circuit.name(), Some("ghz"));
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_out_of_range_ignored() {
        // Invalid indices are dropped; backend validation reports them
        let circuit = CircuitBuilder::new(1).h(0).x(7).build();
        assert_eq!(circuit.len(), 1);
    }
}
