use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::asm::Program;
use crate::os::pcb::LoadOptions;

pub type DeviceId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    Cpu,
    Io,
    Exit,
    // "nothing to execute"; never stored in a program
    Noop,
}

impl Instruction {
    pub fn is_valid(self) -> bool {
        !matches!(self, Instruction::Noop)
    }

    pub fn is_cpu(self) -> bool {
        matches!(self, Instruction::Cpu)
    }

    pub fn is_exit(self) -> bool {
        matches!(self, Instruction::Exit)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Cpu => "CPU",
            Instruction::Io => "IO",
            Instruction::Exit => "EXIT",
            Instruction::Noop => "NOOP",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Instruction {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_uppercase().as_str() {
            "CPU" => Ok(Instruction::Cpu),
            "IO" => Ok(Instruction::Io),
            "EXIT" => Ok(Instruction::Exit),
            _ => Err(format!("Invalid instruction: {}", input)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterruptCode {
    New,
    Kill,
    IoIn,
    IoOut,
    Swap,
    Dispatch,
}

impl InterruptCode {
    pub const ALL: [InterruptCode; 6] = [
        InterruptCode::New,
        InterruptCode::Kill,
        InterruptCode::IoIn,
        InterruptCode::IoOut,
        InterruptCode::Swap,
        InterruptCode::Dispatch,
    ];
}

impl fmt::Display for InterruptCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterruptCode::New => "#NEW",
            InterruptCode::Kill => "#KILL",
            InterruptCode::IoIn => "#IO_IN",
            InterruptCode::IoOut => "#IO_OUT",
            InterruptCode::Swap => "#SWAP",
            InterruptCode::Dispatch => "#DISPATCH",
        };
        f.write_str(name)
    }
}

/// An interrupt request. Consumed by dispatch, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    New { program: Program, options: LoadOptions },
    Kill,
    IoIn { device: DeviceId },
    IoOut { device: DeviceId },
    Swap,
    Dispatch { preemptive: bool },
}

impl Interrupt {
    pub fn code(&self) -> InterruptCode {
        match self {
            Interrupt::New { .. } => InterruptCode::New,
            Interrupt::Kill => InterruptCode::Kill,
            Interrupt::IoIn { .. } => InterruptCode::IoIn,
            Interrupt::IoOut { .. } => InterruptCode::IoOut,
            Interrupt::Swap => InterruptCode::Swap,
            Interrupt::Dispatch { .. } => InterruptCode::Dispatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_from_str_test() {
        assert_eq!(Ok(Instruction::Cpu), "cpu".parse());
        assert_eq!(Ok(Instruction::Io), "IO".parse());
        assert_eq!(Ok(Instruction::Exit), "Exit".parse());
        assert!("NOOP".parse::<Instruction>().is_err());
        assert!("jmp".parse::<Instruction>().is_err());
    }

    #[test]
    fn noop_is_not_valid_test() {
        assert!(!Instruction::Noop.is_valid());
        assert!(Instruction::Cpu.is_valid());
        assert!(Instruction::Exit.is_valid());
    }

    #[test]
    fn interrupt_code_test() {
        assert_eq!(InterruptCode::Swap, Interrupt::Swap.code());
        assert_eq!(
            InterruptCode::Dispatch,
            Interrupt::Dispatch { preemptive: false }.code()
        );
        assert_eq!("#IO_OUT", InterruptCode::IoOut.to_string());
    }
}
