use std::collections::BTreeMap;

use crate::error::{Fault, Res};

use super::pcb::{Pcb, Pid};

/// Pid -> PCB registry. Pids are handed out in increasing order and never
/// reused, even after removal.
#[derive(Debug, Default)]
pub struct ProcessTable {
    table: BTreeMap<Pid, Pcb>,
    last_pid: u32,
}

impl ProcessTable {
    pub fn new() -> ProcessTable {
        ProcessTable::default()
    }

    pub fn next_pid(&mut self) -> Pid {
        self.last_pid += 1;
        Pid(self.last_pid)
    }

    /// Last pid handed out, if any.
    pub fn last_used_pid(&self) -> Option<Pid> {
        if self.last_pid == 0 {
            None
        } else {
            Some(Pid(self.last_pid))
        }
    }

    pub fn insert(&mut self, pcb: Pcb) {
        self.table.insert(pcb.pid(), pcb);
    }

    pub fn get(&self, pid: Pid) -> Res<&Pcb> {
        self.table.get(&pid).ok_or(Fault::UnknownProcess(pid))
    }

    pub fn get_mut(&mut self, pid: Pid) -> Res<&mut Pcb> {
        self.table.get_mut(&pid).ok_or(Fault::UnknownProcess(pid))
    }

    pub fn remove(&mut self, pid: Pid) -> Res<Pcb> {
        self.table.remove(&pid).ok_or(Fault::UnknownProcess(pid))
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.table.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.table.keys().copied()
    }

    pub fn pcbs(&self) -> impl Iterator<Item = &Pcb> {
        self.table.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::pcb::LoadOptions;

    #[test]
    fn pids_are_never_reused_test() {
        let mut table = ProcessTable::new();
        assert_eq!(None, table.last_used_pid());
        let a = table.next_pid();
        table.insert(Pcb::new(a, 0, 1, 0, LoadOptions::default()));
        table.remove(a).unwrap();
        let b = table.next_pid();
        assert!(b > a);
        assert_eq!(Some(b), table.last_used_pid());
        assert!(table.is_empty());
        assert_eq!(Err(Fault::UnknownProcess(a)), table.get(a).map(|_| ()));
    }
}
