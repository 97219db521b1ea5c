//! The kernel: process table, scheduler and its policies, loader, IO
//! controllers, and the interrupt handlers that tie them together.

pub mod dispatcher;
mod handlers;
pub mod io_controller;
pub mod kernel;
pub mod loader;
pub mod pcb;
pub mod process_table;
pub mod sched;
pub mod scheduler;
