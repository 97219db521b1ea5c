//! Background clock driver.
//!
//! One thread ticks the shared `Computer`, sleeping `delay()` between ticks.
//! The sleep is a `recv_timeout` on the stop channel, so `turn_off` wakes the
//! loop immediately. A tick is always finished under the lock before the
//! next one can start.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam_channel as chan;

use crate::asm::Program;
use crate::computer::Computer;
use crate::error::Res;
use crate::os::pcb::{LoadOptions, Pid};

struct Runner {
    stop_tx: chan::Sender<()>,
    handle: thread::JoinHandle<()>,
}

pub struct Machine {
    computer: Arc<Mutex<Computer>>,
    runner: Mutex<Option<Runner>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Machine {
    pub fn new(computer: Computer) -> Machine {
        Machine {
            computer: Arc::new(Mutex::new(computer)),
            runner: Mutex::new(None),
        }
    }

    /// Start ticking in the background. Does nothing if already running.
    pub fn turn_on(&self) {
        let mut runner = lock(&self.runner);
        if runner.is_some() {
            log::debug!("machine already on");
            return;
        }
        let (stop_tx, stop_rx) = chan::bounded::<()>(1);
        let computer = Arc::clone(&self.computer);
        let handle = thread::spawn(move || loop {
            let delay = {
                let mut computer = lock(&*computer);
                computer.tick();
                computer.delay()
            };
            if delay.is_zero() {
                // let callers waiting on the lock in
                thread::yield_now();
            }
            match stop_rx.recv_timeout(delay) {
                Err(chan::RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        });
        log::info!("machine on");
        *runner = Some(Runner { stop_tx, handle });
    }

    /// Stop the background loop and wait for it. Does nothing if stopped.
    pub fn turn_off(&self) {
        let mut runner = lock(&self.runner);
        let Some(Runner { stop_tx, handle }) = runner.take() else {
            return;
        };
        let _ = stop_tx.send(());
        drop(stop_tx);
        if handle.join().is_err() {
            log::error!("clock thread panicked");
        }
        log::info!("machine off");
    }

    pub fn is_on(&self) -> bool {
        lock(&self.runner).is_some()
    }

    /// Lock the computer for inspection or single-stepping.
    pub fn computer(&self) -> MutexGuard<'_, Computer> {
        lock(&*self.computer)
    }

    pub fn load_program(&self, program: Program) -> Res<()> {
        self.computer().load_program(program)
    }

    pub fn load_program_with(&self, program: Program, options: LoadOptions) -> Res<()> {
        self.computer().load_program_with(program, options)
    }

    pub fn kill_process(&self, pid: Pid) -> Res<()> {
        self.computer().kill_process(pid)
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        self.turn_off();
    }
}
