//! Decoded pulse defaults.
//!
//! The server reports estimated frequencies in GHz; [`PulseDefaults`]
//! carries them in Hz so callers never have to track the wire unit.

use qlink_client::DeviceDefaults;

/// Pulse defaults for a backend with pulse access
#[derive(Debug, Clone)]
pub struct PulseDefaults {
    /// Estimated qubit drive frequencies in Hz
    pub qubit_freq: Vec<f64>,

    /// Estimated measurement frequencies in Hz
    pub meas_freq: Vec<f64>,

    /// Buffer between pulses in dt cycles
    pub buffer: Option<u64>,
}

impl PulseDefaults {
    /// Decode from the wire format (GHz → Hz)
    pub fn from_api(api: DeviceDefaults) -> Self {
        Self {
            qubit_freq: api.qubit_freq_est.iter().map(|f| f * 1e9).collect(),
            meas_freq: api.meas_freq_est.iter().map(|f| f * 1e9).collect(),
            buffer: api.buffer,
        }
    }

    /// Drive frequency of a qubit in Hz
    pub fn qubit_frequency(&self, qubit: usize) -> Option<f64> {
        self.qubit_freq.get(qubit).copied()
    }

    /// Measurement frequency of a qubit in Hz
    pub fn meas_frequency(&self, qubit: usize) -> Option<f64> {
        self.meas_freq.get(qubit).copied()
    }
}
