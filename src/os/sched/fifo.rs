use std::collections::VecDeque;

use crate::os::pcb::{Pcb, Pid};

use super::{AlgorithmKind, SchedulingAlgorithm};

/// Arrival-ordered ready queue, shared by FCFS and Round Robin.
#[derive(Debug, Clone, Default)]
pub struct FifoReady {
    queue: VecDeque<Pid>,
}

impl FifoReady {
    pub fn push(&mut self, pid: Pid) {
        self.queue.push_back(pid);
    }

    pub fn head(&self) -> Option<Pid> {
        self.queue.front().copied()
    }

    pub fn remove(&mut self, pid: Pid) {
        self.queue.retain(|&p| p != pid);
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.queue.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fcfs {
    ready: FifoReady,
}

impl Fcfs {
    pub fn new() -> Fcfs {
        Fcfs::default()
    }
}

impl SchedulingAlgorithm for Fcfs {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Fcfs
    }

    fn next_process_id(&self) -> Option<Pid> {
        self.ready.head()
    }

    fn move_to_ready(&mut self, pcb: &Pcb) {
        self.ready.push(pcb.pid());
    }

    fn move_to_running(&mut self, pcb: &Pcb) {
        self.ready.remove(pcb.pid());
    }

    fn remove(&mut self, pid: Pid) {
        self.ready.remove(pid);
    }

    fn ready_pids(&self) -> Vec<Pid> {
        self.ready.pids()
    }
}
