//! Ready-queue policies.
//!
//! The scheduler owns the state machine; an algorithm only decides who is
//! next. Hooks are called with the PCB before its state flips, so a policy
//! can still see where the process came from.

pub mod fifo;
pub mod priority;
pub mod rr;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Fault;

use super::pcb::{Pcb, Pid};

pub trait SchedulingAlgorithm: Send {
    fn kind(&self) -> AlgorithmKind;

    fn is_preemptive(&self) -> bool {
        self.kind().is_preemptive()
    }

    /// Head of the ready structure, without removing it.
    fn next_process_id(&self) -> Option<Pid>;

    fn move_to_ready(&mut self, pcb: &Pcb);

    /// `pcb` is the candidate returned by `next_process_id`.
    fn move_to_running(&mut self, pcb: &Pcb);

    fn move_to_waiting(&mut self, _pcb: &Pcb) {}

    /// Drop `pid` from the ready structure if it is there.
    fn remove(&mut self, pid: Pid);

    /// Called once per tick in which `pid` executed and is still running.
    /// Returns true when the running process must be swapped out.
    fn on_tick(&mut self, _pid: Pid) -> bool {
        false
    }

    /// Ready pids in dispatch order.
    fn ready_pids(&self) -> Vec<Pid>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlgorithmKind {
    #[default]
    #[serde(rename = "FCFS")]
    Fcfs,
    #[serde(rename = "SJF")]
    Sjf,
    #[serde(rename = "LJF")]
    Ljf,
    #[serde(rename = "FPPS")]
    Fpps,
    #[serde(rename = "SRTF")]
    Srtf,
    #[serde(rename = "LRTF")]
    Lrtf,
    #[serde(rename = "RR")]
    Rr,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 7] = [
        AlgorithmKind::Fcfs,
        AlgorithmKind::Sjf,
        AlgorithmKind::Ljf,
        AlgorithmKind::Fpps,
        AlgorithmKind::Srtf,
        AlgorithmKind::Lrtf,
        AlgorithmKind::Rr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::Fcfs => "FCFS",
            AlgorithmKind::Sjf => "SJF",
            AlgorithmKind::Ljf => "LJF",
            AlgorithmKind::Fpps => "FPPS",
            AlgorithmKind::Srtf => "SRTF",
            AlgorithmKind::Lrtf => "LRTF",
            AlgorithmKind::Rr => "RR",
        }
    }

    pub fn is_preemptive(self) -> bool {
        matches!(
            self,
            AlgorithmKind::Fpps | AlgorithmKind::Srtf | AlgorithmKind::Lrtf | AlgorithmKind::Rr
        )
    }

    /// `quantum` is only used by Round Robin.
    pub fn build(self, quantum: u32) -> Box<dyn SchedulingAlgorithm> {
        match self {
            AlgorithmKind::Fcfs => Box::new(fifo::Fcfs::new()),
            AlgorithmKind::Rr => Box::new(rr::RoundRobin::new(quantum)),
            _ => Box::new(priority::Keyed::new(self)),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FCFS" | "FIFO" => Ok(AlgorithmKind::Fcfs),
            "SJF" => Ok(AlgorithmKind::Sjf),
            "LJF" => Ok(AlgorithmKind::Ljf),
            "FPPS" => Ok(AlgorithmKind::Fpps),
            "SRTF" => Ok(AlgorithmKind::Srtf),
            "LRTF" => Ok(AlgorithmKind::Lrtf),
            "RR" | "ROUND_ROBIN" => Ok(AlgorithmKind::Rr),
            _ => Err(Fault::UnknownAlgorithm(s.to_string())),
        }
    }
}
