//! Quantum circuit structure.
//!
//! A [`Circuit`] is an ordered list of [`Instruction`]s over a fixed qubit
//! register. Circuits are the primary submission unit of the SDK; they are
//! validated at construction time so that backends can assume instruction
//! indices are in range.

use crate::error::{QlinkError, QlinkResult};
use crate::instruction::Instruction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    num_qubits: usize,

    /// Instruction sequence
    instructions: Vec<Instruction>,

    /// Optional circuit name (copied into the job payload header)
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            instructions: Vec::new(),
            name: None,
        }
    }

    /// Create a named empty circuit
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            num_qubits,
            instructions: Vec::new(),
            name: Some(name.into()),
        }
    }

    /// Create from an instruction sequence, validating qubit indices
    pub fn from_instructions(
        num_qubits: usize,
        instructions: Vec<Instruction>,
    ) -> QlinkResult<Self> {
        let circuit = Self {
            num_qubits,
            instructions,
            name: None,
        };
        circuit.validate()?;
        Ok(circuit)
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Append an instruction, validating its qubit indices
    pub fn push(&mut self, instruction: Instruction) -> QlinkResult<()> {
        for &qubit in &instruction.qubits() {
            if qubit >= self.num_qubits {
                return Err(QlinkError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
        }
        if let Some(angle) = instruction.params().iter().find(|a| !a.is_finite()) {
            return Err(QlinkError::InvalidAngle(*angle));
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Append multiple instructions
    pub fn extend(
        &mut self,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> QlinkResult<()> {
        for instruction in instructions {
            self.push(instruction)?;
        }
        Ok(())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the instruction sequence
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Mutable access to the instruction sequence.
    ///
    /// Used by backends for in-place rewrites (e.g. replacing deprecated
    /// `id` instructions with `delay`).
    pub fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit has no instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Total instruction count
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    // ========================================================================
    // Analysis
    // ========================================================================

    /// Circuit depth (longest dependency chain over qubits)
    pub fn depth(&self) -> usize {
        if self.instructions.is_empty() {
            return 0;
        }

        let mut qubit_depths = vec![0usize; self.num_qubits];
        for instruction in &self.instructions {
            let qubits = instruction.qubits();
            if qubits.is_empty() {
                // Global directive: synchronizes every qubit
                let max = *qubit_depths.iter().max().unwrap_or(&0);
                for d in &mut qubit_depths {
                    *d = max + 1;
                }
            } else {
                let max = qubits
                    .iter()
                    .filter_map(|&q| qubit_depths.get(q))
                    .max()
                    .copied()
                    .unwrap_or(0);
                for &q in &qubits {
                    if q < self.num_qubits {
                        qubit_depths[q] = max + 1;
                    }
                }
            }
        }
        qubit_depths.into_iter().max().unwrap_or(0)
    }

    /// Count measurement instructions
    pub fn count_measurements(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.is_measurement())
            .count()
    }

    /// Check whether any instruction has the given wire name
    pub fn contains_instruction(&self, name: &str) -> bool {
        self.instructions.iter().any(|i| i.name() == name)
    }

    fn validate(&self) -> QlinkResult<()> {
        for instruction in &self.instructions {
            for &qubit in &instruction.qubits() {
                if qubit >= self.num_qubits {
                    return Err(QlinkError::QubitOutOfRange {
                        qubit,
                        num_qubits: self.num_qubits,
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Circuit({}, {} qubits, {} instructions, depth {})",
            self.name.as_deref().unwrap_or("unnamed"),
            self.num_qubits,
            self.instructions.len(),
            self.depth()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_validates_qubits() {
        let mut circuit = Circuit::new(2);
        assert!(circuit.push(Instruction::H(0)).is_ok());
        assert!(matches!(
            circuit.push(Instruction::X(5)),
            Err(QlinkError::QubitOutOfRange { qubit: 5, .. })
        ));
    }

    #[test]
    fn test_push_rejects_non_finite_angle() {
        let mut circuit = Circuit::new(1);
        assert!(matches!(
            circuit.push(Instruction::Rz(0, f64::NAN)),
            Err(QlinkError::InvalidAngle(_))
        ));
    }

    #[test]
    fn test_from_instructions() {
        let circuit = Circuit::from_instructions(
            2,
            vec![
                Instruction::H(0),
                Instruction::Cx(0, 1),
                Instruction::MeasureAll,
            ],
        )
        .unwrap();
        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.count_measurements(), 1);

        assert!(Circuit::from_instructions(1, vec![Instruction::Cx(0, 1)]).is_err());
    }

    #[test]
    fn test_depth() {
        let mut circuit = Circuit::new(3);
        circuit.push(Instruction::H(0)).unwrap();
        circuit.push(Instruction::Cx(0, 1)).unwrap();
        circuit.push(Instruction::Cx(1, 2)).unwrap();
        assert_eq!(circuit.depth(), 3);

        // Parallel gates do not add depth
        let mut wide = Circuit::new(2);
        wide.push(Instruction::H(0)).unwrap();
        wide.push(Instruction::H(1)).unwrap();
        assert_eq!(wide.depth(), 1);
    }

    #[test]
    fn test_contains_instruction() {
        let mut circuit = Circuit::new(1);
        circuit.push(Instruction::Id(0)).unwrap();
        assert!(circuit.contains_instruction("id"));
        assert!(!circuit.contains_instruction("delay"));
    }

    #[test]
    fn test_display() {
        let circuit = Circuit::with_name(2, "bell");
        assert!(circuit.to_string().contains("bell"));
        assert!(circuit.to_string().contains("2 qubits"));
    }
}
