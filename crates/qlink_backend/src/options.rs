//! Run configuration and per-call options.
//!
//! A [`RunConfig`] is the option map serialized into every job payload. It
//! is seeded from backend-declared defaults and then overridden by the
//! caller's [`RunOptions`]. Option keys the SDK does not recognize travel in
//! [`RunOptions::extra`]: they pass through into the payload untouched and
//! are reported back to the backend, which warns (once per key) instead of
//! failing.

use qlink_client::Configuration;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Default number of shots when the backend does not constrain it lower
pub const DEFAULT_SHOTS: u64 = 4000;

/// Default size of a level-0 memory slot
pub const DEFAULT_MEMORY_SLOT_SIZE: u64 = 100;

/// Measurement output level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasLevel {
    /// Raw ADC traces
    Raw,
    /// Kerneled IQ points
    Kerneled,
    /// Discriminated bit values
    Classified,
}

impl MeasLevel {
    /// Wire encoding (0, 1 or 2)
    pub fn as_u8(self) -> u8 {
        match self {
            MeasLevel::Raw => 0,
            MeasLevel::Kerneled => 1,
            MeasLevel::Classified => 2,
        }
    }
}

impl Serialize for MeasLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Measurement return granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasReturn {
    /// Return every shot
    #[serde(rename = "single")]
    Single,
    /// Return the per-program average
    #[serde(rename = "avg")]
    Average,
}

/// Consolidated run configuration, serialized into the job payload.
///
/// Fields left at `None` are omitted from the wire and resolved
/// server-side from the backend's own defaults.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Repetitions of each program
    pub shots: u64,

    /// Return per-shot bitstrings
    pub memory: bool,

    /// Measurement output level
    pub meas_level: MeasLevel,

    /// Measurement return granularity
    pub meas_return: MeasReturn,

    /// Reset qubits to the ground state between shots
    pub init_qubits: bool,

    /// Size of each level-0 memory slot
    pub memory_slot_size: u64,

    /// Number of classical memory slots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_slots: Option<usize>,

    /// Qubit LO frequencies in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qubit_lo_freq: Option<Vec<f64>>,

    /// Measurement LO frequencies in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meas_lo_freq: Option<Vec<f64>>,

    /// Time per program execution in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_time: Option<f64>,

    /// Delay between programs in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_delay: Option<f64>,

    /// Use excited-state-promoted readout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_measure_esp: Option<bool>,

    /// Parameter bindings applied across all programs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_binds: Option<Vec<BTreeMap<String, f64>>>,

    /// Simulation method, injected on simulator backends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Unrecognized options, passed through verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RunConfig {
    /// Seed a run config from a backend's declared defaults
    pub fn defaults_for(configuration: &Configuration) -> Self {
        Self {
            shots: DEFAULT_SHOTS.min(configuration.max_shots),
            memory: false,
            meas_level: MeasLevel::Classified,
            meas_return: MeasReturn::Average,
            init_qubits: true,
            memory_slot_size: DEFAULT_MEMORY_SLOT_SIZE,
            memory_slots: None,
            qubit_lo_freq: None,
            meas_lo_freq: None,
            rep_time: None,
            rep_delay: None,
            use_measure_esp: None,
            parameter_binds: None,
            method: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Per-call run options.
///
/// Every field is optional; anything left unset falls back to the seeded
/// [`RunConfig`] value. Unknown service options go in [`extra`](Self::extra)
/// via [`with_option`](Self::with_option).
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Custom job name
    pub job_name: Option<String>,

    /// Job tags, usable as a filter when listing jobs
    pub job_tags: Vec<String>,

    /// Client-side cap on programs per job (chunking threshold)
    pub max_programs_per_job: Option<usize>,

    /// User header copied verbatim into the result
    pub header: Option<serde_json::Value>,

    /// Repetitions of each program
    pub shots: Option<u64>,

    /// Return per-shot bitstrings
    pub memory: Option<bool>,

    /// Measurement output level
    pub meas_level: Option<MeasLevel>,

    /// Measurement return granularity
    pub meas_return: Option<MeasReturn>,

    /// Number of classical memory slots
    pub memory_slots: Option<usize>,

    /// Size of each level-0 memory slot
    pub memory_slot_size: Option<u64>,

    /// Qubit LO frequencies in Hz
    pub qubit_lo_freq: Option<Vec<f64>>,

    /// Measurement LO frequencies in Hz
    pub meas_lo_freq: Option<Vec<f64>>,

    /// Time per program execution in seconds
    pub rep_time: Option<f64>,

    /// Delay between programs in seconds
    pub rep_delay: Option<f64>,

    /// Reset qubits to the ground state between shots
    pub init_qubits: Option<bool>,

    /// Use excited-state-promoted readout
    pub use_measure_esp: Option<bool>,

    /// Stream live instrument data for this job
    pub live_data_enabled: Option<bool>,

    /// Parameter bindings applied across all programs
    pub parameter_binds: Option<Vec<BTreeMap<String, f64>>>,

    /// Options the SDK does not recognize; passed through with a warning
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RunOptions {
    /// Create empty options (backend defaults apply)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Request per-shot bitstrings
    pub fn with_memory(mut self, memory: bool) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Set the measurement output level
    pub fn with_meas_level(mut self, level: MeasLevel) -> Self {
        self.meas_level = Some(level);
        self
    }

    /// Set the measurement return granularity
    pub fn with_meas_return(mut self, ret: MeasReturn) -> Self {
        self.meas_return = Some(ret);
        self
    }

    /// Set the inter-program repetition time
    pub fn with_rep_time(mut self, rep_time: f64) -> Self {
        self.rep_time = Some(rep_time);
        self
    }

    /// Set the inter-program delay
    pub fn with_rep_delay(mut self, rep_delay: f64) -> Self {
        self.rep_delay = Some(rep_delay);
        self
    }

    /// Request or refuse ESP readout
    pub fn with_use_measure_esp(mut self, use_esp: bool) -> Self {
        self.use_measure_esp = Some(use_esp);
        self
    }

    /// Set the job name
    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    /// Add a job tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.job_tags.push(tag.into());
        self
    }

    /// Set the client-side cap on programs per job
    pub fn with_max_programs_per_job(mut self, max: usize) -> Self {
        self.max_programs_per_job = Some(max);
        self
    }

    /// Attach a user header, copied into the result
    pub fn with_header(mut self, header: serde_json::Value) -> Self {
        self.header = Some(header);
        self
    }

    /// Set an option the SDK does not model; passed through with a warning
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Apply these options over a seeded config.
    ///
    /// Returns the unrecognized option keys that were passed through, for
    /// the caller to warn about (or not, on simulator variants).
    pub fn apply(&self, config: &mut RunConfig) -> Vec<String> {
        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        if let Some(memory) = self.memory {
            config.memory = memory;
        }
        if let Some(level) = self.meas_level {
            config.meas_level = level;
        }
        if let Some(ret) = self.meas_return {
            config.meas_return = ret;
        }
        if let Some(slots) = self.memory_slots {
            config.memory_slots = Some(slots);
        }
        if let Some(size) = self.memory_slot_size {
            config.memory_slot_size = size;
        }
        if let Some(ref freqs) = self.qubit_lo_freq {
            config.qubit_lo_freq = Some(freqs.clone());
        }
        if let Some(ref freqs) = self.meas_lo_freq {
            config.meas_lo_freq = Some(freqs.clone());
        }
        if let Some(rep_time) = self.rep_time {
            config.rep_time = Some(rep_time);
        }
        if let Some(rep_delay) = self.rep_delay {
            config.rep_delay = Some(rep_delay);
        }
        if let Some(init) = self.init_qubits {
            config.init_qubits = init;
        }
        if let Some(esp) = self.use_measure_esp {
            config.use_measure_esp = Some(esp);
        }
        if let Some(ref binds) = self.parameter_binds {
            config.parameter_binds = Some(binds.clone());
        }

        let mut unknown = Vec::new();
        for (key, value) in &self.extra {
            config.extra.insert(key.clone(), value.clone());
            unknown.push(key.clone());
        }
        unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::hardware_config;
    use serde_json::json;

    #[test]
    fn test_defaults_capped_by_max_shots() {
        let mut configuration = hardware_config();
        configuration.max_shots = 1024;
        let config = RunConfig::defaults_for(&configuration);
        assert_eq!(config.shots, 1024);

        configuration.max_shots = 100_000;
        let config = RunConfig::defaults_for(&configuration);
        assert_eq!(config.shots, DEFAULT_SHOTS);
    }

    #[test]
    fn test_apply_overrides() {
        let configuration = hardware_config();
        let mut config = RunConfig::defaults_for(&configuration);

        let options = RunOptions::new()
            .with_shots(8192)
            .with_memory(true)
            .with_rep_delay(0.0001);

        let unknown = options.apply(&mut config);
        assert!(unknown.is_empty());
        assert_eq!(config.shots, 8192);
        assert!(config.memory);
        assert_eq!(config.rep_delay, Some(0.0001));
        // Untouched fields keep their defaults
        assert!(config.init_qubits);
    }

    #[test]
    fn test_unknown_option_passes_through() {
        let configuration = hardware_config();
        let mut config = RunConfig::defaults_for(&configuration);

        let options = RunOptions::new().with_option("noise_amplifier", json!("folding"));
        let unknown = options.apply(&mut config);

        assert_eq!(unknown, vec!["noise_amplifier".to_string()]);
        assert_eq!(config.extra["noise_amplifier"], json!("folding"));

        // ...and lands in the serialized payload
        let payload = serde_json::to_value(&config).unwrap();
        assert_eq!(payload["noise_amplifier"], json!("folding"));
    }

    #[test]
    fn test_serialization_shape() {
        let configuration = hardware_config();
        let config = RunConfig::defaults_for(&configuration);
        let payload = serde_json::to_value(&config).unwrap();

        assert_eq!(payload["meas_level"], json!(2));
        assert_eq!(payload["meas_return"], json!("avg"));
        assert_eq!(payload["init_qubits"], json!(true));
        // None fields are omitted from the wire
        assert!(payload.get("rep_delay").is_none());
        assert!(payload.get("use_measure_esp").is_none());
    }

    #[test]
    fn test_meas_level_encoding() {
        assert_eq!(MeasLevel::Raw.as_u8(), 0);
        assert_eq!(MeasLevel::Kerneled.as_u8(), 1);
        assert_eq!(MeasLevel::Classified.as_u8(), 2);
    }
}
