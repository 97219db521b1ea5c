//! Programs and the assembler that produces them.
//!
//! Source is one mnemonic per line (`CPU`, `IO`, `EXIT`), optionally followed
//! by a repeat count. Blank lines and `#` comments are skipped.

mod scanner;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Res;
use crate::hw::inst::Instruction;

use self::scanner::Scanner;

/// A named instruction sequence that always ends with exactly one `Exit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    name: String,
    instructions: Vec<Instruction>,
}

impl Program {
    /// Strips every `Exit` (and any `Noop`) and appends a single trailing
    /// `Exit`.
    pub fn new(name: impl Into<String>, instructions: impl IntoIterator<Item = Instruction>) -> Program {
        let mut instructions: Vec<Instruction> = instructions
            .into_iter()
            .filter(|i| i.is_valid() && !i.is_exit())
            .collect();
        instructions.push(Instruction::Exit);
        Program {
            name: name.into(),
            instructions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Count of CPU-bound instructions.
    pub fn burst_time(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_cpu()).count()
    }
}

pub fn compile(name: &str, source: &str) -> Res<Program> {
    let insts = Scanner::scan(source)?;
    Ok(Program::new(name, insts))
}

/// Compile a source file; the program is named after the file stem.
pub fn compile_file(path: &Path) -> Result<Res<Program>, std::io::Error> {
    let src = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(compile(&name, &src))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;

    #[test]
    fn exit_is_moved_to_the_end_test() {
        let program = compile("p", "EXIT\nCPU 2\nEXIT\nIO\n").unwrap();
        assert_eq!(
            &[
                Instruction::Cpu,
                Instruction::Cpu,
                Instruction::Io,
                Instruction::Exit
            ],
            program.instructions()
        );
        assert_eq!(2, program.burst_time());
        assert_eq!("p", program.name());
    }

    #[test]
    fn empty_source_is_just_exit_test() {
        let program = compile("empty", "# nothing here\n").unwrap();
        assert_eq!(&[Instruction::Exit], program.instructions());
    }

    #[test]
    fn invalid_token_test() {
        assert!(matches!(
            compile("bad", "CPU\nHALT"),
            Err(Fault::SyntaxFault { line: 2, .. })
        ));
    }
}
