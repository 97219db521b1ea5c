use crate::hw::Hardware;

use super::pcb::{Pcb, Pid};

/// Moves execution context between a PCB and the CPU/MMU registers.
/// At most one context is loaded at a time.
#[derive(Debug, Default)]
pub struct Dispatcher {
    loaded: Option<Pid>,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher::default()
    }

    pub fn loaded(&self) -> Option<Pid> {
        self.loaded
    }

    pub fn load(&mut self, pcb: &Pcb, hw: &mut Hardware) {
        if let Some(prev) = self.loaded {
            log::warn!("dispatcher: loading pid {} over pid {}", pcb.pid(), prev);
        }
        hw.mmu_mut().set_base_limit(pcb.memory_start(), pcb.memory_size());
        hw.cpu_mut().set_pc(pcb.pc());
        self.loaded = Some(pcb.pid());
    }

    /// Copies the PC back into the PCB and idles the CPU.
    pub fn save(&mut self, pcb: &mut Pcb, hw: &mut Hardware) {
        if let Some(pc) = hw.cpu().get_pc() {
            pcb.set_pc(pc);
        }
        hw.cpu_mut().set_idle();
        self.loaded = None;
    }
}
