use crate::asm::Program;
use crate::config::KernelConfig;
use crate::error::{Fault, Res};
use crate::hw::inst::{DeviceId, Interrupt, InterruptCode};
use crate::hw::interrupt::InterruptVector;
use crate::hw::Hardware;

use super::handlers;
use super::io_controller::IoController;
use super::loader::{Loader, Placement};
use super::pcb::{LoadOptions, Pcb, Pid};
use super::process_table::ProcessTable;
use super::sched::AlgorithmKind;
use super::scheduler::Scheduler;

pub type Handler = fn(&mut Kernel, &mut Hardware, Interrupt) -> Res<Option<Interrupt>>;

pub struct Kernel {
    pub(super) table: ProcessTable,
    pub(super) scheduler: Scheduler,
    pub(super) loader: Loader,
    pub(super) controllers: Vec<IoController>,
    vector: InterruptVector<Handler>,
}

impl Kernel {
    pub fn new(config: &KernelConfig, hw: &Hardware) -> Kernel {
        let mut vector: InterruptVector<Handler> = InterruptVector::new();
        vector.register(InterruptCode::New, handlers::new_process);
        vector.register(InterruptCode::Kill, handlers::kill);
        vector.register(InterruptCode::IoIn, handlers::io_in);
        vector.register(InterruptCode::IoOut, handlers::io_out);
        vector.register(InterruptCode::Swap, handlers::swap);
        vector.register(InterruptCode::Dispatch, handlers::dispatch_next);
        Kernel {
            table: ProcessTable::new(),
            scheduler: Scheduler::new(config.algorithm, config.quantum),
            loader: Loader::new(hw.memory().size(), config.placement),
            controllers: hw.device_ids().map(IoController::new).collect(),
            vector,
        }
    }

    /// Handle `irq` and everything it raises, in order, before returning.
    ///
    /// Follow-up interrupts go on a work list instead of recursing. A fault
    /// stops the chain and is returned; interrupts without a handler are
    /// dropped.
    pub fn raise(&mut self, hw: &mut Hardware, irq: Interrupt) -> Res<()> {
        let mut pending = vec![irq];
        while let Some(irq) = pending.pop() {
            let code = irq.code();
            let Some(handler) = self.vector.handler(code) else {
                log::trace!("no handler for {}, ignored", code);
                continue;
            };
            log::debug!("interrupt {}", code);
            if let Some(next) = handler(self, hw, irq)? {
                pending.push(next);
            }
        }
        Ok(())
    }

    /// System call: create a process for `program`. The process first runs
    /// on the next tick.
    pub fn load_program(&mut self, hw: &mut Hardware, program: Program) -> Res<()> {
        self.load_program_with(hw, program, LoadOptions::default())
    }

    pub fn load_program_with(&mut self, hw: &mut Hardware, program: Program, options: LoadOptions) -> Res<()> {
        self.raise(hw, Interrupt::New { program, options })
    }

    /// System call: terminate `pid` whatever state it is in.
    pub fn kill_process(&mut self, hw: &mut Hardware, pid: Pid) -> Res<()> {
        self.table.get(pid)?;
        if self.scheduler.running_pid() == Some(pid) {
            return self.raise(hw, Interrupt::Kill);
        }
        self.scheduler.remove(pid, &mut self.table)?;
        for ctl in &mut self.controllers {
            ctl.cancel(pid);
        }
        self.release(pid, hw)
    }

    /// Free the memory of a terminated process and drop it from the table.
    pub(super) fn release(&mut self, pid: Pid, hw: &mut Hardware) -> Res<()> {
        let pcb = self.table.remove(pid)?;
        self.loader
            .unload(pcb.memory_start(), pcb.memory_size(), hw.memory_mut());
        log::info!("process pid {} terminated", pid);
        Ok(())
    }

    /// Post-CPU bookkeeping for a tick in which `executed` held the CPU.
    pub fn on_cpu_tick(&mut self, hw: &mut Hardware, executed: Option<Pid>) -> Res<()> {
        if self.scheduler.on_cpu_tick(executed) {
            self.raise(hw, Interrupt::Swap)?;
        }
        Ok(())
    }

    /// A fault raised by the CPU while running a process ends that process.
    pub fn handle_fault(&mut self, hw: &mut Hardware, fault: &Fault) -> Res<()> {
        match self.scheduler.running_pid() {
            Some(pid) => {
                log::error!("pid {} faulted: {}; terminating it", pid, fault);
                self.raise(hw, Interrupt::Kill)
            }
            None => {
                log::warn!("fault with no running process: {}", fault);
                Ok(())
            }
        }
    }

    pub fn set_algorithm(&mut self, kind: AlgorithmKind) -> Res<()> {
        self.scheduler.set_algorithm(kind, &self.table)
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.loader.set_placement(placement);
    }

    pub(super) fn controller_mut(&mut self, device: DeviceId) -> Res<&mut IoController> {
        self.controllers
            .get_mut(device)
            .ok_or(Fault::UnknownDevice { device })
    }

    pub fn controllers(&self) -> &[IoController] {
        &self.controllers
    }

    pub fn process_table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn pcb(&self, pid: Pid) -> Res<&Pcb> {
        self.table.get(pid)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn running_pid(&self) -> Option<Pid> {
        self.scheduler.running_pid()
    }

    pub fn interrupt_codes(&self) -> impl Iterator<Item = InterruptCode> + '_ {
        self.vector.registered()
    }
}
