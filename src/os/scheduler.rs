use crate::error::{Fault, Res};
use crate::hw::Hardware;

use super::dispatcher::Dispatcher;
use super::pcb::{Pcb, Pid, ProcessState};
use super::process_table::ProcessTable;
use super::sched::{AlgorithmKind, SchedulingAlgorithm};

pub struct Scheduler {
    algorithm: Box<dyn SchedulingAlgorithm>,
    dispatcher: Dispatcher,
    running: Option<Pid>,
    quantum: u32,
}

fn illegal(pcb: &Pcb, to: ProcessState, detail: &'static str) -> Fault {
    Fault::IllegalStateTransition {
        pid: pcb.pid(),
        from: pcb.state(),
        to,
        detail,
    }
}

fn require_running(pcb: &Pcb, to: ProcessState) -> Res<()> {
    if pcb.state() != ProcessState::Running {
        return Err(illegal(pcb, to, "process is not running"));
    }
    Ok(())
}

impl Scheduler {
    pub fn new(kind: AlgorithmKind, quantum: u32) -> Scheduler {
        Scheduler {
            algorithm: kind.build(quantum),
            dispatcher: Dispatcher::new(),
            running: None,
            quantum,
        }
    }

    pub fn running_pid(&self) -> Option<Pid> {
        self.running
    }

    pub fn algorithm(&self) -> &dyn SchedulingAlgorithm {
        self.algorithm.as_ref()
    }

    pub fn algorithm_kind(&self) -> AlgorithmKind {
        self.algorithm.kind()
    }

    pub fn is_preemptive(&self) -> bool {
        self.algorithm.is_preemptive()
    }

    pub fn next_process_id(&self) -> Option<Pid> {
        self.algorithm.next_process_id()
    }

    pub fn ready_pids(&self) -> Vec<Pid> {
        self.algorithm.ready_pids()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Replace the policy. Ready processes move over in their current
    /// dispatch order; the running process keeps running.
    pub fn set_algorithm(&mut self, kind: AlgorithmKind, table: &ProcessTable) -> Res<()> {
        let mut next = kind.build(self.quantum);
        for pid in self.algorithm.ready_pids() {
            next.move_to_ready(table.get(pid)?);
        }
        log::info!("scheduler: {} -> {}", self.algorithm.kind(), kind);
        self.algorithm = next;
        Ok(())
    }

    pub fn move_to_ready(&mut self, pid: Pid, table: &mut ProcessTable, hw: &mut Hardware) -> Res<()> {
        let pcb = table.get_mut(pid)?;
        let from = pcb.state();
        match from {
            ProcessState::Terminated => {
                return Err(illegal(pcb, ProcessState::Ready, "process already terminated"))
            }
            ProcessState::Ready => return Err(illegal(pcb, ProcessState::Ready, "process already ready")),
            _ => {}
        }
        if !from.can_transition_to(ProcessState::Ready) {
            return Err(illegal(pcb, ProcessState::Ready, "edge not allowed"));
        }
        if from == ProcessState::Running {
            self.dispatcher.save(pcb, hw);
            self.running = None;
        }
        pcb.recalculate_remaining_time(hw.memory());
        self.algorithm.move_to_ready(pcb);
        pcb.transition_to(ProcessState::Ready)?;
        log::debug!("pid {}: {} -> {}", pid, from, ProcessState::Ready);
        Ok(())
    }

    pub fn move_to_running(&mut self, pid: Pid, table: &mut ProcessTable, hw: &mut Hardware) -> Res<()> {
        let pcb = table.get_mut(pid)?;
        if pcb.state() != ProcessState::Ready {
            return Err(illegal(pcb, ProcessState::Running, "process is not ready"));
        }
        if self.running.is_some() {
            return Err(illegal(pcb, ProcessState::Running, "another process is running"));
        }
        if self.algorithm.next_process_id() != Some(pid) {
            return Err(illegal(
                pcb,
                ProcessState::Running,
                "process is not the next candidate",
            ));
        }
        self.running = Some(pid);
        pcb.transition_to(ProcessState::Running)?;
        self.algorithm.move_to_running(pcb);
        self.dispatcher.load(pcb, hw);
        log::debug!("pid {}: {} -> {}", pid, ProcessState::Ready, ProcessState::Running);
        Ok(())
    }

    pub fn move_to_waiting(&mut self, pid: Pid, table: &mut ProcessTable, hw: &mut Hardware) -> Res<()> {
        let pcb = table.get_mut(pid)?;
        require_running(pcb, ProcessState::Waiting)?;
        self.dispatcher.save(pcb, hw);
        self.running = None;
        pcb.transition_to(ProcessState::Waiting)?;
        self.algorithm.move_to_waiting(pcb);
        log::debug!("pid {}: {} -> {}", pid, ProcessState::Running, ProcessState::Waiting);
        Ok(())
    }

    pub fn move_to_terminated(&mut self, pid: Pid, table: &mut ProcessTable, hw: &mut Hardware) -> Res<()> {
        let pcb = table.get_mut(pid)?;
        require_running(pcb, ProcessState::Terminated)?;
        self.dispatcher.save(pcb, hw);
        self.running = None;
        pcb.transition_to(ProcessState::Terminated)?;
        log::debug!("pid {}: {} -> {}", pid, ProcessState::Running, ProcessState::Terminated);
        Ok(())
    }

    /// Terminate a process that is not running, outside the state machine.
    pub fn remove(&mut self, pid: Pid, table: &mut ProcessTable) -> Res<()> {
        let pcb = table.get_mut(pid)?;
        if pcb.state() == ProcessState::Running {
            return Err(illegal(pcb, ProcessState::Terminated, "use move_to_terminated"));
        }
        self.algorithm.remove(pid);
        let from = pcb.state();
        pcb.force_terminated();
        log::debug!("pid {}: {} -> {} (killed)", pid, from, ProcessState::Terminated);
        Ok(())
    }

    /// Time-slice bookkeeping after the CPU phase of a tick. True when the
    /// running process has to be swapped out.
    pub fn on_cpu_tick(&mut self, executed: Option<Pid>) -> bool {
        match (executed, self.running) {
            (Some(pid), Some(running)) if pid == running => self.algorithm.on_tick(pid),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareConfig;
    use crate::os::pcb::LoadOptions;

    fn setup(n: u32) -> (Scheduler, ProcessTable, Hardware) {
        let hw = Hardware::new(&HardwareConfig::default());
        let mut table = ProcessTable::new();
        for i in 0..n {
            let pid = table.next_pid();
            table.insert(Pcb::new(pid, i as usize * 2, 2, 1, LoadOptions::default()));
        }
        (Scheduler::new(AlgorithmKind::Fcfs, 2), table, hw)
    }

    #[test]
    fn running_must_be_next_candidate_test() {
        let (mut sched, mut table, mut hw) = setup(2);
        sched.move_to_ready(Pid(1), &mut table, &mut hw).unwrap();
        sched.move_to_ready(Pid(2), &mut table, &mut hw).unwrap();

        let err = sched.move_to_running(Pid(2), &mut table, &mut hw).unwrap_err();
        assert!(matches!(err, Fault::IllegalStateTransition { .. }));
        assert_eq!(ProcessState::Ready, table.get(Pid(2)).unwrap().state());

        assert_eq!(None, sched.dispatcher().loaded());
        sched.move_to_running(Pid(1), &mut table, &mut hw).unwrap();
        assert_eq!(Some(Pid(1)), sched.running_pid());
        assert_eq!(Some(Pid(1)), sched.dispatcher().loaded());
        assert_eq!(Some(0), hw.cpu().get_pc());
        assert_eq!(Some(Pid(2)), sched.next_process_id());

        // only one running at a time
        assert!(sched.move_to_running(Pid(2), &mut table, &mut hw).is_err());
    }

    #[test]
    fn double_ready_is_illegal_test() {
        let (mut sched, mut table, mut hw) = setup(1);
        sched.move_to_ready(Pid(1), &mut table, &mut hw).unwrap();
        assert!(sched.move_to_ready(Pid(1), &mut table, &mut hw).is_err());
        assert!(sched.move_to_waiting(Pid(1), &mut table, &mut hw).is_err());
        assert!(sched.move_to_terminated(Pid(1), &mut table, &mut hw).is_err());
        assert_eq!(vec![Pid(1)], sched.ready_pids());
    }

    #[test]
    fn running_to_waiting_saves_context_test() {
        let (mut sched, mut table, mut hw) = setup(1);
        sched.move_to_ready(Pid(1), &mut table, &mut hw).unwrap();
        sched.move_to_running(Pid(1), &mut table, &mut hw).unwrap();
        hw.cpu_mut().set_pc(1);
        sched.move_to_waiting(Pid(1), &mut table, &mut hw).unwrap();
        assert_eq!(None, sched.running_pid());
        assert_eq!(None, sched.dispatcher().loaded());
        assert!(hw.cpu().is_idle());
        let pcb = table.get(Pid(1)).unwrap();
        assert_eq!(ProcessState::Waiting, pcb.state());
        assert_eq!(1, pcb.pc());
    }

    #[test]
    fn set_algorithm_keeps_ready_test() {
        let (mut sched, mut table, mut hw) = setup(3);
        for i in 1..=3 {
            sched.move_to_ready(Pid(i), &mut table, &mut hw).unwrap();
        }
        sched.set_algorithm(AlgorithmKind::Rr, &table).unwrap();
        assert_eq!(AlgorithmKind::Rr, sched.algorithm_kind());
        assert_eq!(vec![Pid(1), Pid(2), Pid(3)], sched.ready_pids());
    }
}
