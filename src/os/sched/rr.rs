use crate::os::pcb::{Pcb, Pid};

use super::fifo::FifoReady;
use super::{AlgorithmKind, SchedulingAlgorithm};

/// FIFO ready queue plus a time slice. The slice counter restarts on every
/// dispatch.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    ready: FifoReady,
    quantum: u32,
    elapsed: u32,
}

impl RoundRobin {
    /// A zero quantum is raised to one tick.
    pub fn new(quantum: u32) -> RoundRobin {
        RoundRobin {
            ready: FifoReady::default(),
            quantum: quantum.max(1),
            elapsed: 0,
        }
    }

    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }
}

impl SchedulingAlgorithm for RoundRobin {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Rr
    }

    fn next_process_id(&self) -> Option<Pid> {
        self.ready.head()
    }

    fn move_to_ready(&mut self, pcb: &Pcb) {
        self.ready.push(pcb.pid());
    }

    fn move_to_running(&mut self, pcb: &Pcb) {
        self.ready.remove(pcb.pid());
        self.elapsed = 0;
    }

    fn remove(&mut self, pid: Pid) {
        self.ready.remove(pid);
    }

    fn on_tick(&mut self, pid: Pid) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.quantum {
            log::debug!("rr: quantum of {} ticks expired for pid {}", self.quantum, pid);
            true
        } else {
            false
        }
    }

    fn ready_pids(&self) -> Vec<Pid> {
        self.ready.pids()
    }
}
