//! Fault taxonomy shared by the hardware and kernel layers.
//!
//! Every fault is local and synchronous: it is returned to whoever started
//! the action (a tick, a system call, a state change) and is never retried.

use std::fmt;

use crate::hw::inst::DeviceId;
use crate::os::pcb::{Pid, ProcessState};

pub type Res<T> = Result<T, Fault>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Fault {
    /// Logical address at or beyond the MMU limit.
    AddressFault { logical: usize, limit: usize },
    /// A process state change outside the allowed edge set.
    IllegalStateTransition {
        pid: Pid,
        from: ProcessState,
        to: ProcessState,
        detail: &'static str,
    },
    /// Second request to a device that is still serving one.
    DeviceBusy { device: DeviceId },
    UnknownDevice { device: DeviceId },
    UnknownAlgorithm(String),
    UnknownPlacement(String),
    /// No free contiguous range can hold the program.
    AllocationFault { requested: usize, largest_free: usize },
    /// Invalid token in assembly source (1-based line number).
    SyntaxFault { line: usize, token: String },
    UnknownProcess(Pid),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressFault { logical, limit } => {
                write!(f, "address fault: logical address {logical} is beyond limit {limit}")
            }
            Self::IllegalStateTransition {
                pid,
                from,
                to,
                detail,
            } => write!(
                f,
                "illegal state transition for pid {pid}: {from} -> {to} ({detail})"
            ),
            Self::DeviceBusy { device } => {
                write!(f, "IO device {device} is busy, cannot receive requests")
            }
            Self::UnknownDevice { device } => write!(f, "no IO device with id {device}"),
            Self::UnknownAlgorithm(name) => {
                write!(f, "there is no scheduling algorithm by the name: {name}")
            }
            Self::UnknownPlacement(name) => {
                write!(f, "there is no placement strategy by the name: {name}")
            }
            Self::AllocationFault {
                requested,
                largest_free,
            } => write!(
                f,
                "not enough free memory: need {requested} contiguous cells, largest free range is {largest_free}"
            ),
            Self::SyntaxFault { line, token } => {
                write!(f, "invalid instruction at line {line}: {token}")
            }
            Self::UnknownProcess(pid) => write!(f, "no process with pid {pid}"),
        }
    }
}

impl std::error::Error for Fault {}
