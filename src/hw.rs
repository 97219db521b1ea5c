//! Simulated hardware: memory, MMU, CPU, IO devices, clock and interrupt
//! vector. `Hardware` is the context object handed to every kernel
//! component that touches a register or a memory cell.

pub mod clock;
pub mod cpu;
pub mod inst;
pub mod interrupt;
pub mod io_device;
pub mod memory;
pub mod mmu;
pub mod rng;

use crate::config::HardwareConfig;
use crate::error::{Fault, Res};

use self::cpu::{Bus, Cpu};
use self::inst::{DeviceId, Interrupt};
use self::io_device::IoDevice;
use self::memory::Memory;
use self::mmu::Mmu;
use self::rng::SimRng;

pub struct Hardware {
    memory: Memory,
    mmu: Mmu,
    cpu: Cpu,
    devices: Vec<IoDevice>,
    rng: SimRng,
}

impl Hardware {
    pub fn new(config: &HardwareConfig) -> Hardware {
        let devices = config
            .device_timings
            .iter()
            .enumerate()
            .map(|(id, &time)| IoDevice::new(id, time))
            .collect();
        Hardware {
            memory: Memory::new(config.memory_size),
            mmu: Mmu::new(config.memory_size),
            cpu: Cpu::new(),
            devices,
            rng: SimRng::new(config.seed),
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut Mmu {
        &mut self.mmu
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn devices(&self) -> &[IoDevice] {
        &self.devices
    }

    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.iter().map(IoDevice::id)
    }

    pub fn device(&self, id: DeviceId) -> Res<&IoDevice> {
        self.devices.get(id).ok_or(Fault::UnknownDevice { device: id })
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Res<&mut IoDevice> {
        self.devices
            .get_mut(id)
            .ok_or(Fault::UnknownDevice { device: id })
    }

    /// CPU clock subscriber.
    pub fn tick_cpu(&mut self) -> Res<Option<Interrupt>> {
        let mut bus = Bus {
            mmu: &self.mmu,
            memory: &self.memory,
            rng: &mut self.rng,
            device_count: self.devices.len(),
        };
        self.cpu.tick(&mut bus)
    }

    /// IO device clock subscriber.
    pub fn tick_device(&mut self, id: DeviceId) -> Res<Option<Interrupt>> {
        Ok(self.device_mut(id)?.tick())
    }
}
