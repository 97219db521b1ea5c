//! Tick-driven simulation of a single-CPU computer and the kernel that
//! schedules it.

pub mod app;
pub mod asm;
pub mod computer;
pub mod config;
pub mod driver;
pub mod error;
pub mod hw;
pub mod os;

pub use asm::{compile, Program};
pub use computer::{Computer, TickReport, TickView};
pub use config::{ConfigError, HardwareConfig, KernelConfig, MachineConfig};
pub use driver::Machine;
pub use error::{Fault, Res};
pub use os::pcb::{LoadOptions, Pid, ProcessState};
pub use os::sched::AlgorithmKind;
