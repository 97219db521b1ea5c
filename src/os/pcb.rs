use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Fault, Res};
use crate::hw::memory::Memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    New,
    Ready,
    Waiting,
    Running,
    Terminated,
}

impl ProcessState {
    pub const ALL: [ProcessState; 5] = [
        ProcessState::New,
        ProcessState::Ready,
        ProcessState::Waiting,
        ProcessState::Running,
        ProcessState::Terminated,
    ];

    pub fn can_transition_to(self, to: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, to),
            (New, Ready)
                | (Ready, Running)
                | (Running, Ready)
                | (Running, Waiting)
                | (Waiting, Ready)
                | (Running, Terminated)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Waiting => "WAITING",
            ProcessState::Running => "RUNNING",
            ProcessState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Batch,
    Interactive,
    System,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(Category::Batch),
            "interactive" => Ok(Category::Interactive),
            "system" => Ok(Category::System),
            _ => Err(format!("unknown process category: {}", s)),
        }
    }
}

pub const DEFAULT_PRIORITY: u32 = 3;

/// Arguments carried by the New interrupt besides the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Higher runs first under fixed-priority scheduling.
    pub priority: u32,
    pub category: Category,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            priority: DEFAULT_PRIORITY,
            category: Category::default(),
        }
    }
}

/// Process control block. Owned by the process table for its whole life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcb {
    pid: Pid,
    state: ProcessState,
    memory_start: usize,
    memory_size: usize,
    pc: usize,
    burst_time: usize,
    remaining_time: usize,
    priority: u32,
    category: Category,
}

impl Pcb {
    pub fn new(pid: Pid, memory_start: usize, memory_size: usize, burst_time: usize, options: LoadOptions) -> Pcb {
        Pcb {
            pid,
            state: ProcessState::New,
            memory_start,
            memory_size,
            pc: 0,
            burst_time,
            remaining_time: burst_time,
            priority: options.priority,
            category: options.category,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn memory_start(&self) -> usize {
        self.memory_start
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub fn burst_time(&self) -> usize {
        self.burst_time
    }

    pub fn remaining_time(&self) -> usize {
        self.remaining_time
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Move along one legal edge. On failure the state is left as it was.
    pub fn transition_to(&mut self, to: ProcessState) -> Res<()> {
        if !self.state.can_transition_to(to) {
            return Err(Fault::IllegalStateTransition {
                pid: self.pid,
                from: self.state,
                to,
                detail: "edge not allowed",
            });
        }
        self.state = to;
        Ok(())
    }

    // Administrative kill of a process that is not running.
    pub(crate) fn force_terminated(&mut self) {
        self.state = ProcessState::Terminated;
    }

    /// CPU-bound instructions left in `[pc, size)`.
    pub fn recalculate_remaining_time(&mut self, memory: &Memory) {
        let start = self.memory_start + self.pc.min(self.memory_size);
        let end = self.memory_start + self.memory_size;
        self.remaining_time = memory.count_cpu(start, end);
    }
}

impl fmt::Display for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid {:>3} {:<10} mem [{}, {}) pc {} burst {} remaining {} priority {} {:?}",
            self.pid,
            self.state,
            self.memory_start,
            self.memory_start + self.memory_size,
            self.pc,
            self.burst_time,
            self.remaining_time,
            self.priority,
            self.category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::inst::Instruction;

    #[test]
    fn legal_edges_test() {
        let mut pcb = Pcb::new(Pid(1), 0, 3, 2, LoadOptions::default());
        assert_eq!(ProcessState::New, pcb.state());
        pcb.transition_to(ProcessState::Ready).unwrap();
        pcb.transition_to(ProcessState::Running).unwrap();
        pcb.transition_to(ProcessState::Waiting).unwrap();
        pcb.transition_to(ProcessState::Ready).unwrap();
        pcb.transition_to(ProcessState::Running).unwrap();
        pcb.transition_to(ProcessState::Terminated).unwrap();
    }

    #[test]
    fn illegal_edge_keeps_state_test() {
        let mut pcb = Pcb::new(Pid(4), 0, 3, 2, LoadOptions::default());
        let err = pcb.transition_to(ProcessState::Running).unwrap_err();
        assert!(matches!(
            err,
            Fault::IllegalStateTransition {
                from: ProcessState::New,
                to: ProcessState::Running,
                ..
            }
        ));
        assert_eq!(ProcessState::New, pcb.state());
    }

    #[test]
    fn remaining_time_test() {
        let mut memory = Memory::new(10);
        memory.load(
            5,
            &[Instruction::Cpu, Instruction::Io, Instruction::Cpu, Instruction::Exit],
        );
        let mut pcb = Pcb::new(Pid(1), 5, 4, 2, LoadOptions::default());
        pcb.set_pc(1);
        pcb.recalculate_remaining_time(&memory);
        assert_eq!(1, pcb.remaining_time());
        pcb.set_pc(4);
        pcb.recalculate_remaining_time(&memory);
        assert_eq!(0, pcb.remaining_time());
        assert_eq!(2, pcb.burst_time());
    }
}
