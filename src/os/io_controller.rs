use std::collections::VecDeque;

use crate::error::Res;
use crate::hw::inst::DeviceId;
use crate::hw::Hardware;

use super::pcb::Pid;

/// Request queue in front of one IO device. The device serves one pid at a
/// time; everybody else waits here in arrival order.
#[derive(Debug, Clone)]
pub struct IoController {
    device: DeviceId,
    queue: VecDeque<Pid>,
    active: Option<Pid>,
}

impl IoController {
    pub fn new(device: DeviceId) -> IoController {
        IoController {
            device,
            queue: VecDeque::new(),
            active: None,
        }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn active_pid(&self) -> Option<Pid> {
        self.active
    }

    pub fn queued(&self) -> impl Iterator<Item = Pid> + '_ {
        self.queue.iter().copied()
    }

    pub fn request(&mut self, pid: Pid, hw: &mut Hardware) -> Res<()> {
        self.queue.push_back(pid);
        self.admit(hw)
    }

    /// Called on `IoOut`. Returns the pid that was being served, then starts
    /// the next queued request.
    pub fn finish(&mut self, hw: &mut Hardware) -> Res<Option<Pid>> {
        let done = self.active.take();
        self.admit(hw)?;
        Ok(done)
    }

    /// Forget `pid`. If the device is serving it, the device still runs to
    /// completion but nobody is woken up.
    pub fn cancel(&mut self, pid: Pid) {
        self.queue.retain(|&p| p != pid);
        if self.active == Some(pid) {
            self.active = None;
        }
    }

    fn admit(&mut self, hw: &mut Hardware) -> Res<()> {
        let device = hw.device_mut(self.device)?;
        if self.active.is_some() || device.is_busy() {
            return Ok(());
        }
        if let Some(pid) = self.queue.pop_front() {
            device.request()?;
            log::debug!("io device {} now serving pid {}", self.device, pid);
            self.active = Some(pid);
        }
        Ok(())
    }
}
