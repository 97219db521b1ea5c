use super::inst::Instruction;

/// Flat physical memory. Each cell holds one instruction or nothing.
#[derive(Debug, Clone)]
pub struct Memory {
    cells: Vec<Option<Instruction>>,
}

impl Memory {
    pub fn new(mem_size: usize) -> Memory {
        Memory {
            cells: vec![None; mem_size],
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    // Out-of-range physical addresses are a kernel bug, so indexing panics.
    pub fn read(&self, addr: usize) -> Option<Instruction> {
        self.cells[addr]
    }

    pub fn write(&mut self, addr: usize, value: Option<Instruction>) {
        self.cells[addr] = value;
    }

    pub fn load(&mut self, pos: usize, insts: &[Instruction]) {
        for (i, inst) in insts.iter().enumerate() {
            self.write(pos + i, Some(*inst));
        }
    }

    pub fn clear(&mut self, start: usize, len: usize) {
        for cell in &mut self.cells[start..start + len] {
            *cell = None;
        }
    }

    /// Number of CPU-bound instructions stored in `[start, end)`.
    pub fn count_cpu(&self, start: usize, end: usize) -> usize {
        self.cells[start..end]
            .iter()
            .filter(|cell| matches!(cell, Some(Instruction::Cpu)))
            .count()
    }

    pub fn cells(&self) -> &[Option<Instruction>] {
        &self.cells
    }
}
