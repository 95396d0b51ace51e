//! Pulse schedules.
//!
//! A pulse schedule is a low-level timing program that can be submitted in
//! place of a circuit on backends that expose pulse access. The SDK does not
//! build or analyze schedules; it carries them as an ordered list of timed
//! channel instructions and serializes them verbatim into the job payload.

use crate::error::{QlinkError, QlinkResult};
use serde::{Deserialize, Serialize};

/// A timed instruction on a pulse channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseInstruction {
    /// Channel name (e.g. "d0", "m1", "u2")
    pub channel: String,

    /// Start time in dt cycles
    pub t0: u64,

    /// What to do on the channel
    #[serde(flatten)]
    pub kind: PulseInstructionKind,
}

/// Pulse instruction payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum PulseInstructionKind {
    /// Play a named pulse from the backend's pulse library
    Play {
        /// Pulse name in the library
        pulse: String,
        /// Pulse duration in dt cycles
        duration: u64,
    },

    /// Idle the channel
    Delay {
        /// Delay duration in dt cycles
        duration: u64,
    },

    /// Set the channel carrier frequency
    SetFrequency {
        /// Frequency in Hz
        frequency: f64,
    },

    /// Acquire readout into a memory slot
    Acquire {
        /// Acquisition duration in dt cycles
        duration: u64,
        /// Destination memory slot
        memory_slot: usize,
    },
}

/// Pulse schedule: an ordered, timed program over pulse channels
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PulseSchedule {
    /// Optional schedule name (copied into the job payload header)
    pub name: Option<String>,

    /// Timed channel instructions
    pub instructions: Vec<PulseInstruction>,
}

impl PulseSchedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a named empty schedule
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            instructions: Vec::new(),
        }
    }

    /// Append an instruction, validating the channel name
    pub fn push(&mut self, instruction: PulseInstruction) -> QlinkResult<()> {
        if instruction.channel.is_empty() {
            return Err(QlinkError::InvalidPulseInstruction(
                "channel name is empty".to_string(),
            ));
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Total duration in dt cycles (end of the latest instruction)
    pub fn duration(&self) -> u64 {
        self.instructions
            .iter()
            .map(|i| {
                let len = match i.kind {
                    PulseInstructionKind::Play { duration, .. } => duration,
                    PulseInstructionKind::Delay { duration } => duration,
                    PulseInstructionKind::SetFrequency { .. } => 0,
                    PulseInstructionKind::Acquire { duration, .. } => duration,
                };
                i.t0 + len
            })
            .max()
            .unwrap_or(0)
    }

    /// Check if the schedule has no instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(channel: &str, t0: u64, duration: u64) -> PulseInstruction {
        PulseInstruction {
            channel: channel.to_string(),
            t0,
            kind: PulseInstructionKind::Play {
                pulse: "gaussian_0".to_string(),
                duration,
            },
        }
    }

    #[test]
    fn test_duration() {
        let mut schedule = PulseSchedule::new();
        schedule.push(play("d0", 0, 160)).unwrap();
        schedule.push(play("d1", 100, 160)).unwrap();
        assert_eq!(schedule.duration(), 260);
    }

    #[test]
    fn test_empty_channel_rejected() {
        let mut schedule = PulseSchedule::new();
        assert!(schedule.push(play("", 0, 10)).is_err());
    }

    #[test]
    fn test_serialization_shape() {
        let mut schedule = PulseSchedule::with_name("cal");
        schedule
            .push(PulseInstruction {
                channel: "d0".to_string(),
                t0: 0,
                kind: PulseInstructionKind::SetFrequency { frequency: 5.1e9 },
            })
            .unwrap();

        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["instructions"][0]["name"], "set_frequency");
        assert_eq!(json["instructions"][0]["channel"], "d0");
    }
}
