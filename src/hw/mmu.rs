use crate::error::{Fault, Res};

use super::inst::Instruction;
use super::memory::Memory;

/// Base + limit relocation. Logical addresses are bounds-checked against the
/// limit before they are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmu {
    base: usize,
    limit: usize,
}

impl Mmu {
    pub fn new(limit: usize) -> Mmu {
        Mmu { base: 0, limit }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_base_limit(&mut self, base: usize, limit: usize) {
        self.base = base;
        self.limit = limit;
    }

    pub fn translate(&self, logical: usize) -> Res<usize> {
        if logical >= self.limit {
            return Err(Fault::AddressFault {
                logical,
                limit: self.limit,
            });
        }
        Ok(self.base + logical)
    }

    pub fn fetch(&self, memory: &Memory, logical: usize) -> Res<Option<Instruction>> {
        let physical = self.translate(logical)?;
        Ok(memory.read(physical))
    }

    pub fn place(&self, memory: &mut Memory, logical: usize, value: Option<Instruction>) -> Res<()> {
        let physical = self.translate(logical)?;
        memory.write(physical, value);
        Ok(())
    }
}
