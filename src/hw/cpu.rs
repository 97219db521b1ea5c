use std::fmt;

use crate::error::Res;

use super::inst::{Instruction, Interrupt};
use super::memory::Memory;
use super::mmu::Mmu;
use super::rng::SimRng;

#[derive(Debug, Clone, Copy)]
struct Fetched {
    inst: Instruction,
    pc: usize,
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pc={0:>3}: {1}", self.pc, self.inst)
    }
}

/// Bus the CPU reaches during one cycle.
pub struct Bus<'a> {
    pub mmu: &'a Mmu,
    pub memory: &'a Memory,
    pub rng: &'a mut SimRng,
    pub device_count: usize,
}

/// Two registers: program counter and instruction register.
/// `pc == None` is the idle sentinel.
#[derive(Debug, Clone)]
pub struct Cpu {
    pc: Option<usize>,
    ir: Instruction,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            pc: None,
            ir: Instruction::Noop,
        }
    }

    pub fn get_pc(&self) -> Option<usize> {
        self.pc
    }

    pub fn set_pc(&mut self, pc: usize) {
        self.pc = Some(pc);
    }

    pub fn set_idle(&mut self) {
        self.pc = None;
    }

    pub fn is_idle(&self) -> bool {
        self.pc.is_none()
    }

    pub fn is_busy(&self) -> bool {
        self.pc.is_some()
    }

    pub fn ir(&self) -> Instruction {
        self.ir
    }

    fn fetch(&mut self, pc: usize, bus: &Bus) -> Res<Fetched> {
        let inst = bus.mmu.fetch(bus.memory, pc)?.unwrap_or(Instruction::Noop);
        self.ir = inst;
        self.pc = Some(pc + 1);
        Ok(Fetched { inst, pc })
    }

    fn decode(&self, _fetched: &Fetched) {}

    fn execute(&mut self, fetched: &Fetched, bus: &mut Bus) -> Option<Interrupt> {
        match fetched.inst {
            Instruction::Cpu | Instruction::Noop => None,
            Instruction::Io => {
                if bus.device_count == 0 {
                    log::warn!("IO instruction at pc {} but no IO devices; running it as CPU work", fetched.pc);
                    return None;
                }
                let device = bus.rng.index(bus.device_count);
                Some(Interrupt::IoIn { device })
            }
            Instruction::Exit => Some(Interrupt::Kill),
        }
    }

    /// One fetch-decode-execute cycle. The returned interrupt must be fully
    /// handled before anything else observes the tick.
    pub fn tick(&mut self, bus: &mut Bus) -> Res<Option<Interrupt>> {
        let pc = match self.pc {
            Some(pc) => pc,
            None => {
                self.ir = Instruction::Noop;
                log::trace!("cpu idle");
                return Ok(None);
            }
        };
        let fetched = self.fetch(pc, bus)?;
        log::trace!("fetched: {}", fetched);
        self.decode(&fetched);
        Ok(self.execute(&fetched, bus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(insts: &[Instruction]) -> (Memory, Mmu, SimRng) {
        let mut memory = Memory::new(16);
        memory.load(4, insts);
        let mut mmu = Mmu::new(16);
        mmu.set_base_limit(4, insts.len());
        (memory, mmu, SimRng::new(1))
    }

    #[test]
    fn idle_cpu_executes_noop_test() {
        let (memory, mmu, mut rng) = machine(&[Instruction::Cpu]);
        let mut cpu = Cpu::new();
        let mut bus = Bus { mmu: &mmu, memory: &memory, rng: &mut rng, device_count: 1 };
        assert_eq!(Ok(None), cpu.tick(&mut bus));
        assert_eq!(Instruction::Noop, cpu.ir());
        assert!(cpu.is_idle());
    }

    #[test]
    fn fetch_execute_test() {
        let (memory, mmu, mut rng) =
            machine(&[Instruction::Cpu, Instruction::Io, Instruction::Exit]);
        let mut cpu = Cpu::new();
        cpu.set_pc(0);
        let mut bus = Bus { mmu: &mmu, memory: &memory, rng: &mut rng, device_count: 1 };

        assert_eq!(Ok(None), cpu.tick(&mut bus));
        assert_eq!(Some(1), cpu.get_pc());
        assert_eq!(Instruction::Cpu, cpu.ir());

        assert_eq!(Ok(Some(Interrupt::IoIn { device: 0 })), cpu.tick(&mut bus));
        assert_eq!(Some(2), cpu.get_pc());

        assert_eq!(Ok(Some(Interrupt::Kill)), cpu.tick(&mut bus));
        assert_eq!(Some(3), cpu.get_pc());
    }

    #[test]
    fn io_picks_configured_device_test() {
        let (memory, mmu, mut rng) = machine(&[Instruction::Io; 8]);
        let mut cpu = Cpu::new();
        cpu.set_pc(0);
        let mut bus = Bus { mmu: &mmu, memory: &memory, rng: &mut rng, device_count: 3 };
        for _ in 0..8 {
            match cpu.tick(&mut bus) {
                Ok(Some(Interrupt::IoIn { device })) => assert!(device < 3),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn fetch_beyond_limit_faults_test() {
        let (memory, mmu, mut rng) = machine(&[Instruction::Cpu]);
        let mut cpu = Cpu::new();
        cpu.set_pc(1);
        let mut bus = Bus { mmu: &mmu, memory: &memory, rng: &mut rng, device_count: 1 };
        assert!(cpu.tick(&mut bus).is_err());
        assert_eq!(Some(1), cpu.get_pc());
    }
}
