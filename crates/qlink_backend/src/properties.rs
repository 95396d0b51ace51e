//! Decoded device properties.
//!
//! [`BackendProperties`] wraps the wire-format calibration tables with
//! unit-aware accessors. Values are scaled to base SI units (seconds, hertz)
//! regardless of the unit the server reported them in; timestamps are
//! converted from UTC to local time at decode.

use chrono::{DateTime, Local};
use qlink_client::{DeviceProperties, GateProperties, ParameterValue};

/// Device properties (calibration data) with typed accessors
#[derive(Debug, Clone)]
pub struct BackendProperties {
    /// Backend name
    pub backend_name: String,

    /// Backend version
    pub backend_version: Option<String>,

    /// Calibration timestamp, local time
    pub last_update_date: DateTime<Local>,

    qubits: Vec<Vec<ParameterValue>>,
    gates: Vec<GateProperties>,
    general: Vec<ParameterValue>,
}

impl BackendProperties {
    /// Decode from the wire format
    pub fn from_api(api: DeviceProperties) -> Self {
        Self {
            backend_name: api.backend_name,
            backend_version: api.backend_version,
            last_update_date: api.last_update_date.with_timezone(&Local),
            qubits: api.qubits,
            gates: api.gates,
            general: api.general,
        }
    }

    /// Number of qubits covered by the calibration tables
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// A named per-qubit parameter, scaled to base SI units
    pub fn qubit_parameter(&self, qubit: usize, name: &str) -> Option<f64> {
        self.qubits
            .get(qubit)?
            .iter()
            .find(|p| p.name == name)
            .map(scaled_value)
    }

    /// T1 relaxation time in seconds
    pub fn t1(&self, qubit: usize) -> Option<f64> {
        self.qubit_parameter(qubit, "T1")
    }

    /// T2 dephasing time in seconds
    pub fn t2(&self, qubit: usize) -> Option<f64> {
        self.qubit_parameter(qubit, "T2")
    }

    /// Qubit frequency in Hz
    pub fn frequency(&self, qubit: usize) -> Option<f64> {
        self.qubit_parameter(qubit, "frequency")
    }

    /// Readout error probability
    pub fn readout_error(&self, qubit: usize) -> Option<f64> {
        self.qubit_parameter(qubit, "readout_error")
    }

    /// A named parameter of a gate on the given qubit tuple
    pub fn gate_parameter(&self, gate: &str, qubits: &[usize], name: &str) -> Option<f64> {
        self.gates
            .iter()
            .find(|g| g.gate == gate && g.qubits == qubits)?
            .parameters
            .iter()
            .find(|p| p.name == name)
            .map(scaled_value)
    }

    /// Gate duration in seconds for a single-qubit gate
    pub fn gate_length(&self, gate: &str, qubit: usize) -> Option<f64> {
        self.gate_parameter(gate, &[qubit], "gate_length")
    }

    /// Gate error for a single-qubit gate
    pub fn gate_error(&self, gate: &str, qubit: usize) -> Option<f64> {
        self.gate_parameter(gate, &[qubit], "gate_error")
    }

    /// A named device-wide parameter, scaled to base SI units
    pub fn general_parameter(&self, name: &str) -> Option<f64> {
        self.general.iter().find(|p| p.name == name).map(scaled_value)
    }
}

/// Scale a parameter value to base SI units according to its declared unit
fn scaled_value(param: &ParameterValue) -> f64 {
    let scale = match param.unit.as_deref() {
        Some("s") | Some("") | None => 1.0,
        Some("ms") => 1e-3,
        Some("us") | Some("µs") => 1e-6,
        Some("ns") => 1e-9,
        Some("GHz") => 1e9,
        Some("MHz") => 1e6,
        Some("kHz") => 1e3,
        Some("Hz") => 1.0,
        // Unknown units are reported verbatim
        Some(_) => 1.0,
    };
    param.value * scale
}
