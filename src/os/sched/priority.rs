use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::os::pcb::{Pcb, Pid};

use super::{AlgorithmKind, SchedulingAlgorithm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    key: i64,
    seq: u64,
    pid: Pid,
}

// Greater entries are dispatched first: larger key, then earlier arrival.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of ready pids keyed per algorithm, arrival order breaking ties.
#[derive(Debug, Clone, Default)]
pub struct PriorityReady {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl PriorityReady {
    pub fn push(&mut self, pid: Pid, key: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { key, seq, pid });
    }

    pub fn head(&self) -> Option<Pid> {
        self.heap.peek().map(|e| e.pid)
    }

    pub fn remove(&mut self, pid: Pid) {
        self.heap.retain(|e| e.pid != pid);
    }

    pub fn pids(&self) -> Vec<Pid> {
        let mut entries = self.heap.clone().into_sorted_vec();
        entries.reverse();
        entries.into_iter().map(|e| e.pid).collect()
    }
}

fn to_key(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// SJF, LJF, FPPS, SRTF and LRTF: one heap, different keys.
#[derive(Debug, Clone)]
pub struct Keyed {
    kind: AlgorithmKind,
    ready: PriorityReady,
}

impl Keyed {
    pub fn new(kind: AlgorithmKind) -> Keyed {
        debug_assert!(!matches!(kind, AlgorithmKind::Fcfs | AlgorithmKind::Rr));
        Keyed {
            kind,
            ready: PriorityReady::default(),
        }
    }

    fn key(&self, pcb: &Pcb) -> i64 {
        match self.kind {
            AlgorithmKind::Sjf => -to_key(pcb.burst_time()),
            AlgorithmKind::Ljf => to_key(pcb.burst_time()),
            AlgorithmKind::Fpps => i64::from(pcb.priority()),
            AlgorithmKind::Srtf => -to_key(pcb.remaining_time()),
            AlgorithmKind::Lrtf => to_key(pcb.remaining_time()),
            AlgorithmKind::Fcfs | AlgorithmKind::Rr => 0,
        }
    }
}

impl SchedulingAlgorithm for Keyed {
    fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    fn next_process_id(&self) -> Option<Pid> {
        self.ready.head()
    }

    fn move_to_ready(&mut self, pcb: &Pcb) {
        let key = self.key(pcb);
        self.ready.push(pcb.pid(), key);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::inst::Instruction;
    use crate::hw::memory::Memory;
    use crate::os::pcb::LoadOptions;

    fn pcb(pid: u32, burst: usize, priority: u32) -> Pcb {
        Pcb::new(
            Pid(pid),
            0,
            burst + 1,
            burst,
            LoadOptions {
                priority,
                ..LoadOptions::default()
            },
        )
    }

    fn order(kind: AlgorithmKind, pcbs: &[Pcb]) -> Vec<Pid> {
        let mut algo = Keyed::new(kind);
        for pcb in pcbs {
            algo.move_to_ready(pcb);
        }
        let by_view = algo.ready_pids();
        let mut taken = Vec::new();
        while let Some(pid) = algo.next_process_id() {
            let pcb = pcbs.iter().find(|p| p.pid() == pid).unwrap();
            algo.move_to_running(pcb);
            taken.push(pid);
        }
        assert_eq!(by_view, taken);
        taken
    }

    #[test]
    fn sjf_ljf_test() {
        let pcbs = [pcb(1, 5, 3), pcb(2, 1, 3), pcb(3, 3, 3)];
        assert_eq!(vec![Pid(2), Pid(3), Pid(1)], order(AlgorithmKind::Sjf, &pcbs));
        assert_eq!(vec![Pid(1), Pid(3), Pid(2)], order(AlgorithmKind::Ljf, &pcbs));
    }

    #[test]
    fn fpps_ties_by_arrival_test() {
        let pcbs = [pcb(1, 1, 2), pcb(2, 1, 7), pcb(3, 1, 2), pcb(4, 1, 7)];
        assert_eq!(
            vec![Pid(2), Pid(4), Pid(1), Pid(3)],
            order(AlgorithmKind::Fpps, &pcbs)
        );
    }

    #[test]
    fn lrtf_test() {
        let mut pcbs = [pcb(1, 2, 3), pcb(2, 4, 3), pcb(3, 2, 3), pcb(4, 3, 3)];
        assert_eq!(
            vec![Pid(2), Pid(4), Pid(1), Pid(3)],
            order(AlgorithmKind::Lrtf, &pcbs)
        );

        // keyed by what is left after the saved pc
        let mut memory = Memory::new(8);
        memory.load(0, &[Instruction::Cpu; 4]);
        memory.load(4, &[Instruction::Exit]);
        pcbs[1].set_pc(3);
        pcbs[1].recalculate_remaining_time(&memory);
        assert_eq!(1, pcbs[1].remaining_time());
        assert_eq!(
            vec![Pid(4), Pid(1), Pid(3), Pid(2)],
            order(AlgorithmKind::Lrtf, &pcbs)
        );
    }

    #[test]
    fn remove_test() {
        let pcbs = [pcb(1, 2, 3), pcb(2, 1, 3)];
        let mut algo = Keyed::new(AlgorithmKind::Srtf);
        for pcb in &pcbs {
            algo.move_to_ready(pcb);
        }
        assert_eq!(Some(Pid(2)), algo.next_process_id());
        algo.remove(Pid(2));
        assert_eq!(Some(Pid(1)), algo.next_process_id());
        assert!(algo.is_preemptive());
    }
}
