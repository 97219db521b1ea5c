//! Composition root: hardware, kernel and the clock that drives them.
//!
//! One `tick()` is the unit of atomicity. Subscribers run in clock priority
//! order; the CPU comes first, and any interrupt it raises is fully handled
//! before the IO devices advance.

use std::time::Duration;

use crate::asm::Program;
use crate::config::{ConfigError, MachineConfig};
use crate::error::{Fault, Res};
use crate::hw::clock::Clock;
use crate::hw::inst::DeviceId;
use crate::hw::Hardware;
use crate::os::kernel::Kernel;
use crate::os::loader::Placement;
use crate::os::pcb::{LoadOptions, Pid};
use crate::os::sched::AlgorithmKind;

pub const CPU_PRIORITY: i32 = 30;
pub const IO_PRIORITY: i32 = 15;
pub const OBSERVER_PRIORITY: i32 = 0;

pub type Observer = Box<dyn FnMut(&TickView<'_>) + Send>;

pub enum Subscriber {
    Cpu,
    IoDevice(DeviceId),
    Observer(Observer),
}

/// Read-only view handed to observers.
pub struct TickView<'a> {
    pub tick: u64,
    /// Process that held the CPU during this tick.
    pub executed: Option<Pid>,
    pub hardware: &'a Hardware,
    pub kernel: &'a Kernel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub executed: Option<Pid>,
    /// Faults raised and recovered during the tick.
    pub faults: Vec<Fault>,
}

pub struct Computer {
    clock: Clock<Subscriber>,
    hardware: Hardware,
    kernel: Kernel,
}

impl Computer {
    pub fn new(config: &MachineConfig) -> Result<Computer, ConfigError> {
        config.validate()?;
        let hardware = Hardware::new(&config.hardware);
        let kernel = Kernel::new(&config.kernel, &hardware);
        let mut clock = Clock::new(config.hardware.clock_speed);
        if config.hardware.overclock {
            clock.overclock();
        }
        clock.add_subscriber(Subscriber::Cpu, CPU_PRIORITY);
        for id in hardware.device_ids() {
            clock.add_subscriber(Subscriber::IoDevice(id), IO_PRIORITY);
        }
        log::info!(
            "computer: {} memory cells, {} io devices, {} scheduling",
            hardware.memory().size(),
            hardware.devices().len(),
            kernel.scheduler().algorithm_kind()
        );
        Ok(Computer {
            clock,
            hardware,
            kernel,
        })
    }

    pub fn subscribe<F>(&mut self, priority: i32, observer: F)
    where
        F: FnMut(&TickView<'_>) + Send + 'static,
    {
        self.clock
            .add_subscriber(Subscriber::Observer(Box::new(observer)), priority);
    }

    pub fn tick(&mut self) -> TickReport {
        let Computer {
            clock,
            hardware,
            kernel,
        } = self;
        let tick = clock.advance();
        log::trace!("tick {}", tick);
        let mut report = TickReport {
            tick,
            executed: None,
            faults: Vec::new(),
        };
        for subscriber in clock.subscribers_mut() {
            match subscriber {
                Subscriber::Cpu => cpu_phase(hardware, kernel, &mut report),
                Subscriber::IoDevice(id) => {
                    let res = match hardware.tick_device(*id) {
                        Ok(Some(irq)) => kernel.raise(hardware, irq),
                        Ok(None) => Ok(()),
                        Err(e) => Err(e),
                    };
                    if let Err(fault) = res {
                        log::warn!("tick {}: io device {}: {}", tick, id, fault);
                        report.faults.push(fault);
                    }
                }
                Subscriber::Observer(observer) => observer(&TickView {
                    tick,
                    executed: report.executed,
                    hardware: &*hardware,
                    kernel: &*kernel,
                }),
            }
        }
        report
    }

    pub fn run(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    pub fn load_program(&mut self, program: Program) -> Res<()> {
        self.kernel.load_program(&mut self.hardware, program)
    }

    pub fn load_program_with(&mut self, program: Program, options: LoadOptions) -> Res<()> {
        self.kernel
            .load_program_with(&mut self.hardware, program, options)
    }

    pub fn kill_process(&mut self, pid: Pid) -> Res<()> {
        self.kernel.kill_process(&mut self.hardware, pid)
    }

    pub fn set_algorithm(&mut self, name: &str) -> Res<()> {
        let kind: AlgorithmKind = name.parse()?;
        self.kernel.set_algorithm(kind)
    }

    pub fn set_placement(&mut self, name: &str) -> Res<()> {
        let placement: Placement = name.parse()?;
        self.kernel.set_placement(placement);
        Ok(())
    }

    pub fn overclock(&mut self) {
        self.clock.overclock();
    }

    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    /// Pause the background driver takes between ticks.
    pub fn delay(&self) -> Duration {
        self.clock.delay()
    }

    pub fn last_tick(&self) -> u64 {
        self.clock.last_tick()
    }

    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}

fn cpu_phase(hardware: &mut Hardware, kernel: &mut Kernel, report: &mut TickReport) {
    let executed = if hardware.cpu().is_busy() {
        kernel.running_pid()
    } else {
        None
    };
    report.executed = executed;
    let res = match hardware.tick_cpu() {
        Ok(Some(irq)) => kernel.raise(hardware, irq),
        Ok(None) => Ok(()),
        Err(fault) => {
            report.faults.push(fault.clone());
            kernel.handle_fault(hardware, &fault)
        }
    };
    let res = res.and_then(|()| kernel.on_cpu_tick(hardware, executed));
    if let Err(fault) = res {
        log::warn!("tick {}: cpu: {}", report.tick, fault);
        report.faults.push(fault);
    }
}
