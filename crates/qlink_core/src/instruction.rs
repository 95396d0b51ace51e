//! Circuit instruction definitions.
//!
//! The instruction set mirrors what the QLink service accepts on the wire:
//! the common single- and two-qubit gates, the timing instructions (`id`,
//! `delay`, `barrier`) and the measurement/reset directives.

use serde::{Deserialize, Serialize};

/// Qubit identifier (0-indexed)
pub type QubitId = usize;

/// Rotation angle in radians
pub type Angle = f64;

/// A single circuit instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================
    /// Hadamard gate
    H(QubitId),

    /// Pauli-X gate
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate
    Sdg(QubitId),

    /// T gate
    T(QubitId),

    /// T-dagger gate
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// Identity (legacy no-op; deprecated on hardware backends in favor of
    /// an explicit `Delay`)
    Id(QubitId),

    // ========================================================================
    // Parameterized Rotations
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// Phase gate P(λ)
    P(QubitId, Angle),

    /// General single-qubit rotation U(θ, φ, λ)
    U(QubitId, Angle, Angle, Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// Controlled-NOT
    Cx(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// Echoed cross-resonance (hardware-native two-qubit gate)
    Ecr(QubitId, QubitId),

    // ========================================================================
    // Timing, Measurement and Control
    // ========================================================================
    /// Idle the qubit for a fixed number of `dt` sample cycles
    Delay(QubitId, u64),

    /// Measure a single qubit
    Measure(QubitId),

    /// Measure all qubits (convenience)
    MeasureAll,

    /// Barrier over the given qubits (empty = all)
    Barrier(Vec<QubitId>),

    /// Reset qubit to |0⟩
    Reset(QubitId),
}

impl Instruction {
    /// Wire name of this instruction
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::H(_) => "h",
            Instruction::X(_) => "x",
            Instruction::Y(_) => "y",
            Instruction::Z(_) => "z",
            Instruction::S(_) => "s",
            Instruction::Sdg(_) => "sdg",
            Instruction::T(_) => "t",
            Instruction::Tdg(_) => "tdg",
            Instruction::Sx(_) => "sx",
            Instruction::Id(_) => "id",
            Instruction::Rx(_, _) => "rx",
            Instruction::Ry(_, _) => "ry",
            Instruction::Rz(_, _) => "rz",
            Instruction::P(_, _) => "p",
            Instruction::U(_, _, _, _) => "u",
            Instruction::Cx(_, _) => "cx",
            Instruction::Cz(_, _) => "cz",
            Instruction::Swap(_, _) => "swap",
            Instruction::Ecr(_, _) => "ecr",
            Instruction::Delay(_, _) => "delay",
            Instruction::Measure(_) => "measure",
            Instruction::MeasureAll => "measure",
            Instruction::Barrier(_) => "barrier",
            Instruction::Reset(_) => "reset",
        }
    }

    /// Qubits this instruction acts on (empty for global directives)
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Instruction::H(q)
            | Instruction::X(q)
            | Instruction::Y(q)
            | Instruction::Z(q)
            | Instruction::S(q)
            | Instruction::Sdg(q)
            | Instruction::T(q)
            | Instruction::Tdg(q)
            | Instruction::Sx(q)
            | Instruction::Id(q)
            | Instruction::Rx(q, _)
            | Instruction::Ry(q, _)
            | Instruction::Rz(q, _)
            | Instruction::P(q, _)
            | Instruction::U(q, _, _, _)
            | Instruction::Delay(q, _)
            | Instruction::Measure(q)
            | Instruction::Reset(q) => vec![*q],

            Instruction::Cx(c, t)
            | Instruction::Cz(c, t)
            | Instruction::Swap(c, t)
            | Instruction::Ecr(c, t) => vec![*c, *t],

            Instruction::MeasureAll => Vec::new(),
            Instruction::Barrier(qs) => qs.clone(),
        }
    }

    /// Rotation parameters, if any
    pub fn params(&self) -> Vec<Angle> {
        match self {
            Instruction::Rx(_, a) | Instruction::Ry(_, a) | Instruction::Rz(_, a) => {
                vec![*a]
            }
            Instruction::P(_, a) => vec![*a],
            Instruction::U(_, t, p, l) => vec![*t, *p, *l],
            _ => Vec::new(),
        }
    }

    /// True for gates acting on exactly one qubit
    pub fn is_single_qubit(&self) -> bool {
        matches!(
            self,
            Instruction::H(_)
                | Instruction::X(_)
                | Instruction::Y(_)
                | Instruction::Z(_)
                | Instruction::S(_)
                | Instruction::Sdg(_)
                | Instruction::T(_)
                | Instruction::Tdg(_)
                | Instruction::Sx(_)
                | Instruction::Id(_)
                | Instruction::Rx(_, _)
                | Instruction::Ry(_, _)
                | Instruction::Rz(_, _)
                | Instruction::P(_, _)
                | Instruction::U(_, _, _, _)
        )
    }

    /// True for gates acting on exactly two qubits
    pub fn is_two_qubit(&self) -> bool {
        matches!(
            self,
            Instruction::Cx(_, _)
                | Instruction::Cz(_, _)
                | Instruction::Swap(_, _)
                | Instruction::Ecr(_, _)
        )
    }

    /// True for measurement instructions
    pub fn is_measurement(&self) -> bool {
        matches!(self, Instruction::Measure(_) | Instruction::MeasureAll)
    }

    /// True for rotation gates carrying an angle parameter
    pub fn is_parameterized(&self) -> bool {
        !self.params().is_empty()
    }

    /// True for timing/layout directives that carry no unitary
    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            Instruction::Barrier(_) | Instruction::Delay(_, _) | Instruction::Id(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names() {
        assert_eq!(Instruction::H(0).name(), "h");
        assert_eq!(Instruction::Id(3).name(), "id");
        assert_eq!(Instruction::Delay(3, 160).name(), "delay");
        assert_eq!(Instruction::Cx(0, 1).name(), "cx");
    }

    #[test]
    fn test_qubits() {
        assert_eq!(Instruction::Rz(2, 0.5).qubits(), vec![2]);
        assert_eq!(Instruction::Ecr(1, 4).qubits(), vec![1, 4]);
        assert!(Instruction::MeasureAll.qubits().is_empty());
        assert_eq!(Instruction::Barrier(vec![0, 2]).qubits(), vec![0, 2]);
    }

    #[test]
    fn test_params() {
        assert_eq!(Instruction::U(0, 0.1, 0.2, 0.3).params(), vec![0.1, 0.2, 0.3]);
        assert!(Instruction::X(0).params().is_empty());
        assert!(Instruction::X(0).is_single_qubit());
        assert!(Instruction::Swap(0, 1).is_two_qubit());
        assert!(Instruction::Rz(0, 1.0).is_parameterized());
    }

    #[test]
    fn test_directives() {
        assert!(Instruction::Id(0).is_directive());
        assert!(Instruction::Delay(0, 10).is_directive());
        assert!(!Instruction::Measure(0).is_directive());
        assert!(Instruction::Measure(0).is_measurement());
    }

    #[test]
    fn test_serde_roundtrip() {
        let instr = Instruction::Delay(2, 320);
        let json = serde_json::to_string(&instr).unwrap();
        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(instr, back);
    }
}
