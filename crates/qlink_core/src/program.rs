//! Submission program union.
//!
//! Backends accept either gate-level circuits or pulse schedules in a single
//! run request; [`Program`] is the common carrier for both.

use crate::circuit::Circuit;
use crate::schedule::PulseSchedule;
use serde::{Deserialize, Serialize};

/// A unit of work submittable to a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Program {
    /// Gate-level circuit
    Circuit(Circuit),

    /// Pulse-level schedule
    Schedule(PulseSchedule),
}

impl Program {
    /// Program name, if one was set
    pub fn name(&self) -> Option<&str> {
        match self {
            Program::Circuit(c) => c.name(),
            Program::Schedule(s) => s.name.as_deref(),
        }
    }

    /// True if this is a gate-level circuit
    pub fn is_circuit(&self) -> bool {
        matches!(self, Program::Circuit(_))
    }

    /// Borrow as a circuit
    pub fn as_circuit(&self) -> Option<&Circuit> {
        match self {
            Program::Circuit(c) => Some(c),
            Program::Schedule(_) => None,
        }
    }

    /// Mutably borrow as a circuit
    pub fn as_circuit_mut(&mut self) -> Option<&mut Circuit> {
        match self {
            Program::Circuit(c) => Some(c),
            Program::Schedule(_) => None,
        }
    }

    /// Borrow as a pulse schedule
    pub fn as_schedule(&self) -> Option<&PulseSchedule> {
        match self {
            Program::Circuit(_) => None,
            Program::Schedule(s) => Some(s),
        }
    }
}

impl From<Circuit> for Program {
    fn from(circuit: Circuit) -> Self {
        Program::Circuit(circuit)
    }
}

impl From<PulseSchedule> for Program {
    fn from(schedule: PulseSchedule) -> Self {
        Program::Schedule(schedule)
    }
}
