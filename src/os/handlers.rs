//! The six interrupt handlers. Each one returns the follow-up interrupt it
//! raises, if any; `Kernel::raise` runs it before returning to the caller.

use crate::error::Res;
use crate::hw::inst::Interrupt;
use crate::hw::Hardware;

use super::kernel::Kernel;

fn dispatch(kernel: &Kernel) -> Option<Interrupt> {
    Some(Interrupt::Dispatch {
        preemptive: kernel.scheduler.is_preemptive(),
    })
}

pub fn new_process(kernel: &mut Kernel, hw: &mut Hardware, irq: Interrupt) -> Res<Option<Interrupt>> {
    let Interrupt::New { program, options } = irq else {
        return Ok(None);
    };
    let start = kernel.loader.load(&program, hw.memory_mut())?;
    let pid = kernel.table.next_pid();
    let pcb = super::pcb::Pcb::new(pid, start, program.len(), program.burst_time(), options);
    kernel.table.insert(pcb);
    log::info!("new process pid {} from {} ({} cells at {})", pid, program.name(), program.len(), start);
    kernel.scheduler.move_to_ready(pid, &mut kernel.table, hw)?;
    Ok(dispatch(kernel))
}

pub fn kill(kernel: &mut Kernel, hw: &mut Hardware, _irq: Interrupt) -> Res<Option<Interrupt>> {
    let Some(pid) = kernel.scheduler.running_pid() else {
        log::warn!("kill interrupt with no running process");
        return Ok(None);
    };
    kernel.scheduler.move_to_terminated(pid, &mut kernel.table, hw)?;
    kernel.release(pid, hw)?;
    Ok(dispatch(kernel))
}

pub fn io_in(kernel: &mut Kernel, hw: &mut Hardware, irq: Interrupt) -> Res<Option<Interrupt>> {
    let Interrupt::IoIn { device } = irq else {
        return Ok(None);
    };
    let Some(pid) = kernel.scheduler.running_pid() else {
        log::warn!("io request on device {} with no running process", device);
        return Ok(None);
    };
    // checked before the state change so an unknown device leaves pid running
    kernel.controller_mut(device)?;
    kernel.scheduler.move_to_waiting(pid, &mut kernel.table, hw)?;
    kernel.controller_mut(device)?.request(pid, hw)?;
    Ok(dispatch(kernel))
}

pub fn io_out(kernel: &mut Kernel, hw: &mut Hardware, irq: Interrupt) -> Res<Option<Interrupt>> {
    let Interrupt::IoOut { device } = irq else {
        return Ok(None);
    };
    match kernel.controller_mut(device)?.finish(hw)? {
        Some(pid) => {
            kernel.scheduler.move_to_ready(pid, &mut kernel.table, hw)?;
            Ok(dispatch(kernel))
        }
        None => {
            log::debug!("io device {} finished a cancelled request", device);
            Ok(None)
        }
    }
}

pub fn swap(kernel: &mut Kernel, hw: &mut Hardware, _irq: Interrupt) -> Res<Option<Interrupt>> {
    if let Some(pid) = kernel.scheduler.running_pid() {
        kernel.scheduler.move_to_ready(pid, &mut kernel.table, hw)?;
    }
    Ok(Some(Interrupt::Dispatch { preemptive: true }))
}

pub fn dispatch_next(kernel: &mut Kernel, hw: &mut Hardware, irq: Interrupt) -> Res<Option<Interrupt>> {
    let Interrupt::Dispatch { preemptive } = irq else {
        return Ok(None);
    };
    let running = kernel.scheduler.running_pid();
    if !preemptive && running.is_some() {
        return Ok(None);
    }
    if let Some(pid) = running {
        kernel.scheduler.move_to_ready(pid, &mut kernel.table, hw)?;
    }
    if let Some(next) = kernel.scheduler.next_process_id() {
        kernel.scheduler.move_to_running(next, &mut kernel.table, hw)?;
    }
    Ok(None)
}
