use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::asm::Program;
use crate::error::{Fault, Res};
use crate::hw::memory::Memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    #[default]
    #[serde(alias = "first")]
    FirstFit,
    #[serde(alias = "best")]
    BestFit,
    #[serde(alias = "worst")]
    WorstFit,
}

impl Placement {
    /// Pick a start among `(start, len)` ranges with `len >= size`.
    fn choose(self, free: &BTreeMap<usize, usize>, size: usize) -> Option<usize> {
        let mut fits = free.iter().filter(|&(_, &len)| len >= size);
        let chosen = match self {
            Placement::FirstFit => fits.next(),
            // ties go to the lowest address
            Placement::BestFit => fits.min_by_key(|&(_, &len)| len),
            Placement::WorstFit => fits.min_by_key(|&(_, &len)| std::cmp::Reverse(len)),
        };
        chosen.map(|(&start, _)| start)
    }
}

impl FromStr for Placement {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "firstfit" | "first_fit" | "first-fit" => Ok(Placement::FirstFit),
            "best" | "bestfit" | "best_fit" | "best-fit" => Ok(Placement::BestFit),
            "worst" | "worstfit" | "worst_fit" | "worst-fit" => Ok(Placement::WorstFit),
            _ => Err(Fault::UnknownPlacement(s.to_string())),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Placement::FirstFit => "first fit",
            Placement::BestFit => "best fit",
            Placement::WorstFit => "worst fit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    placement: Placement,
    // start -> len, neighbours merged on release
    free: BTreeMap<usize, usize>,
}

impl Loader {
    pub fn new(memory_size: usize, placement: Placement) -> Loader {
        let mut free = BTreeMap::new();
        if memory_size > 0 {
            free.insert(0, memory_size);
        }
        Loader { placement, free }
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    pub fn free_ranges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.free.iter().map(|(&start, &len)| (start, len))
    }

    pub fn largest_free(&self) -> usize {
        self.free.values().copied().max().unwrap_or(0)
    }

    pub fn free_cells(&self) -> usize {
        self.free.values().sum()
    }

    pub fn allocate(&mut self, size: usize) -> Res<usize> {
        let start = self
            .placement
            .choose(&self.free, size)
            .ok_or(Fault::AllocationFault {
                requested: size,
                largest_free: self.largest_free(),
            })?;
        if let Some(len) = self.free.remove(&start) {
            if len > size {
                self.free.insert(start + size, len - size);
            }
        }
        Ok(start)
    }

    pub fn release(&mut self, start: usize, size: usize) {
        if size == 0 {
            return;
        }
        let mut start = start;
        let mut size = size;
        if let Some((&prev_start, &prev_len)) = self.free.range(..start).next_back() {
            if prev_start + prev_len == start {
                self.free.remove(&prev_start);
                start = prev_start;
                size += prev_len;
            }
        }
        if let Some(next_len) = self.free.remove(&(start + size)) {
            size += next_len;
        }
        self.free.insert(start, size);
    }

    /// Allocate and write the program; returns the start offset.
    pub fn load(&mut self, program: &Program, memory: &mut Memory) -> Res<usize> {
        let start = self.allocate(program.len())?;
        memory.load(start, program.instructions());
        log::debug!(
            "loader: {} placed at [{}, {}) by {}",
            program.name(),
            start,
            start + program.len(),
            self.placement
        );
        Ok(start)
    }

    pub fn unload(&mut self, start: usize, size: usize, memory: &mut Memory) {
        memory.clear(start, size);
        self.release(start, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragmented(placement: Placement) -> Loader {
        // free: [0,3) [5,10) [12,14) [16,20)
        let mut loader = Loader::new(20, placement);
        loader.free.clear();
        loader.free.insert(0, 3);
        loader.free.insert(5, 5);
        loader.free.insert(12, 2);
        loader.free.insert(16, 4);
        loader
    }

    #[test]
    fn placement_choice_test() {
        assert_eq!(Ok(5), fragmented(Placement::FirstFit).allocate(4));
        assert_eq!(Ok(16), fragmented(Placement::BestFit).allocate(4));
        assert_eq!(Ok(5), fragmented(Placement::WorstFit).allocate(2));
        assert_eq!(Ok(12), fragmented(Placement::BestFit).allocate(2));
        assert_eq!(Ok(0), fragmented(Placement::FirstFit).allocate(2));
    }

    #[test]
    fn allocation_fault_test() {
        let mut loader = fragmented(Placement::FirstFit);
        assert_eq!(
            Err(Fault::AllocationFault {
                requested: 6,
                largest_free: 5
            }),
            loader.allocate(6)
        );
    }

    #[test]
    fn release_coalesces_test() {
        let mut loader = Loader::new(10, Placement::FirstFit);
        let a = loader.allocate(3).unwrap();
        let b = loader.allocate(3).unwrap();
        let c = loader.allocate(4).unwrap();
        assert_eq!((0, 3, 6), (a, b, c));
        assert_eq!(0, loader.free_cells());

        loader.release(a, 3);
        loader.release(c, 4);
        assert_eq!(vec![(0, 3), (6, 4)], loader.free_ranges().collect::<Vec<_>>());
        loader.release(b, 3);
        assert_eq!(vec![(0, 10)], loader.free_ranges().collect::<Vec<_>>());
    }

    #[test]
    fn placement_from_str_test() {
        assert_eq!(Ok(Placement::BestFit), "best".parse());
        assert_eq!(Ok(Placement::WorstFit), "WorstFit".parse());
        assert_eq!(
            Err(Fault::UnknownPlacement("next".to_string())),
            "next".parse::<Placement>()
        );
    }
}
