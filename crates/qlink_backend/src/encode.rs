//! Program encoding for job payloads.
//!
//! Circuits are shipped as OpenQASM 3.0 text; pulse schedules are shipped as
//! their JSON form. Encoding is literal: no transpilation or basis rewriting
//! happens here, the service compiles programs server-side.

use qlink_core::{Circuit, Instruction, PulseSchedule};

/// Encode a circuit as an OpenQASM 3.0 program
pub fn circuit_to_qasm3(circuit: &Circuit) -> String {
    let mut qasm = String::new();

    qasm.push_str("OPENQASM 3.0;\n");
    qasm.push_str("include \"stdgates.inc\";\n\n");

    qasm.push_str(&format!("qubit[{}] q;\n", circuit.num_qubits()));
    qasm.push_str(&format!("bit[{}] c;\n\n", circuit.num_qubits()));

    let mut measure_idx = 0;
    for instruction in circuit.instructions() {
        match instruction {
            Instruction::H(q) => qasm.push_str(&format!("h q[{}];\n", q)),
            Instruction::X(q) => qasm.push_str(&format!("x q[{}];\n", q)),
            Instruction::Y(q) => qasm.push_str(&format!("y q[{}];\n", q)),
            Instruction::Z(q) => qasm.push_str(&format!("z q[{}];\n", q)),
            Instruction::S(q) => qasm.push_str(&format!("s q[{}];\n", q)),
            Instruction::Sdg(q) => qasm.push_str(&format!("sdg q[{}];\n", q)),
            Instruction::T(q) => qasm.push_str(&format!("t q[{}];\n", q)),
            Instruction::Tdg(q) => qasm.push_str(&format!("tdg q[{}];\n", q)),
            Instruction::Sx(q) => qasm.push_str(&format!("sx q[{}];\n", q)),
            Instruction::Id(q) => qasm.push_str(&format!("id q[{}];\n", q)),
            Instruction::Rx(q, theta) => qasm.push_str(&format!("rx({}) q[{}];\n", theta, q)),
            Instruction::Ry(q, theta) => qasm.push_str(&format!("ry({}) q[{}];\n", theta, q)),
            Instruction::Rz(q, theta) => qasm.push_str(&format!("rz({}) q[{}];\n", theta, q)),
            Instruction::P(q, lambda) => qasm.push_str(&format!("p({}) q[{}];\n", lambda, q)),
            Instruction::U(q, theta, phi, lambda) => {
                qasm.push_str(&format!("U({}, {}, {}) q[{}];\n", theta, phi, lambda, q))
            }
            Instruction::Cx(c, t) => qasm.push_str(&format!("cx q[{}], q[{}];\n", c, t)),
            Instruction::Cz(c, t) => qasm.push_str(&format!("cz q[{}], q[{}];\n", c, t)),
            Instruction::Swap(a, b) => qasm.push_str(&format!("swap q[{}], q[{}];\n", a, b)),
            Instruction::Ecr(a, b) => qasm.push_str(&format!("ecr q[{}], q[{}];\n", a, b)),
            Instruction::Delay(q, duration) => {
                qasm.push_str(&format!("delay[{}dt] q[{}];\n", duration, q))
            }
            Instruction::Measure(q) => {
                qasm.push_str(&format!("c[{}] = measure q[{}];\n", measure_idx, q));
                measure_idx += 1;
            }
            Instruction::MeasureAll => {
                for q in 0..circuit.num_qubits() {
                    qasm.push_str(&format!("c[{}] = measure q[{}];\n", q, q));
                }
            }
            Instruction::Barrier(qubits) => {
                if qubits.is_empty() {
                    qasm.push_str("barrier;\n");
                } else {
                    let qs: Vec<_> = qubits.iter().map(|q| format!("q[{}]", q)).collect();
                    qasm.push_str(&format!("barrier {};\n", qs.join(", ")));
                }
            }
            Instruction::Reset(q) => qasm.push_str(&format!("reset q[{}];\n", q)),
        }
    }

    qasm
}

/// Encode a pulse schedule as its JSON payload form
pub fn schedule_to_value(schedule: &PulseSchedule) -> serde_json::Value {
    // PulseSchedule serializes infallibly: plain structs, string keys
    serde_json::to_value(schedule).expect("pulse schedule serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlink_core::CircuitBuilder;

    #[test]
    fn test_qasm3_header_and_registers() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
        let qasm = circuit_to_qasm3(&circuit);

        assert!(qasm.contains("OPENQASM 3.0"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("c[0] = measure q[0];"));
        assert!(qasm.contains("c[1] = measure q[1];"));
    }

    #[test]
    fn test_qasm3_delay() {
        let circuit = CircuitBuilder::new(1).x(0).delay(0, 160).build();
        let qasm = circuit_to_qasm3(&circuit);
        assert!(qasm.contains("delay[160dt] q[0];"));
    }

    #[test]
    fn test_qasm3_rotations() {
        let circuit = CircuitBuilder::new(1).rz(0, 0.5).rx(0, 1.5).build();
        let qasm = circuit_to_qasm3(&circuit);
        assert!(qasm.contains("rz(0.5) q[0];"));
        assert!(qasm.contains("rx(1.5) q[0];"));
    }

    #[test]
    fn test_qasm3_single_measure_indexing() {
        let circuit = CircuitBuilder::new(3).measure(2).measure(0).build();
        let qasm = circuit_to_qasm3(&circuit);
        assert!(qasm.contains("c[0] = measure q[2];"));
        assert!(qasm.contains("c[1] = measure q[0];"));
    }

    #[test]
    fn test_ghz_gate_count() {
        let circuit = CircuitBuilder::new(5)
            .h(0)
            .cx(0, 1)
            .cx(1, 2)
            .cx(2, 3)
            .cx(3, 4)
            .measure_all()
            .build();
        let qasm = circuit_to_qasm3(&circuit);
        assert_eq!(qasm.matches("cx q[").count(), 4);
    }
}
