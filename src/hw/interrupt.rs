use std::collections::BTreeMap;

use super::inst::InterruptCode;

/// Table from interrupt code to exactly one handler. Filled once by the
/// kernel; entries are replaced, never removed.
#[derive(Debug, Clone)]
pub struct InterruptVector<H> {
    handlers: BTreeMap<InterruptCode, H>,
}

impl<H: Copy> Default for InterruptVector<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy> InterruptVector<H> {
    pub fn new() -> InterruptVector<H> {
        InterruptVector {
            handlers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, code: InterruptCode, handler: H) {
        self.handlers.insert(code, handler);
    }

    /// `None` for unregistered codes; callers drop such interrupts.
    pub fn handler(&self, code: InterruptCode) -> Option<H> {
        self.handlers.get(&code).copied()
    }

    pub fn registered(&self) -> impl Iterator<Item = InterruptCode> + '_ {
        self.handlers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_test() {
        let mut vector: InterruptVector<u8> = InterruptVector::new();
        assert_eq!(None, vector.handler(InterruptCode::Kill));
        vector.register(InterruptCode::Kill, 1);
        vector.register(InterruptCode::Kill, 2);
        assert_eq!(Some(2), vector.handler(InterruptCode::Kill));
        assert_eq!(vec![InterruptCode::Kill], vector.registered().collect::<Vec<_>>());
    }
}
