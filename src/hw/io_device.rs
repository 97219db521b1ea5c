use crate::error::{Fault, Res};

use super::inst::{DeviceId, Interrupt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceState {
    Idle,
    // Accepted this tick, progress starts counting on the next device tick.
    Admitted,
    Serving { elapsed: u32 },
}

/// Simulated IO device with a fixed service time in ticks.
#[derive(Debug, Clone)]
pub struct IoDevice {
    id: DeviceId,
    service_time: u32,
    state: DeviceState,
}

impl IoDevice {
    pub fn new(id: DeviceId, service_time: u32) -> IoDevice {
        IoDevice {
            id,
            service_time,
            state: DeviceState::Idle,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn service_time(&self) -> u32 {
        self.service_time
    }

    pub fn is_busy(&self) -> bool {
        self.state != DeviceState::Idle
    }

    pub fn is_idle(&self) -> bool {
        !self.is_busy()
    }

    /// Ticks already spent on the in-flight request.
    pub fn elapsed(&self) -> Option<u32> {
        match self.state {
            DeviceState::Idle => None,
            DeviceState::Admitted => Some(0),
            DeviceState::Serving { elapsed } => Some(elapsed),
        }
    }

    pub fn request(&mut self) -> Res<()> {
        if self.is_busy() {
            return Err(Fault::DeviceBusy { device: self.id });
        }
        self.state = DeviceState::Admitted;
        Ok(())
    }

    /// Advance the in-flight request. Completion is reported only through the
    /// returned `IoOut`.
    pub fn tick(&mut self) -> Option<Interrupt> {
        let elapsed = match self.state {
            DeviceState::Idle => return None,
            DeviceState::Admitted => 0,
            DeviceState::Serving { elapsed } => elapsed + 1,
        };
        if elapsed >= self.service_time {
            self.state = DeviceState::Idle;
            log::debug!("io device {} finished its request", self.id);
            Some(Interrupt::IoOut { device: self.id })
        } else {
            self.state = DeviceState::Serving { elapsed };
            None
        }
    }
}
