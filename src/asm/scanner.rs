use crate::error::{Fault, Res};
use crate::hw::inst::Instruction;

pub struct Scanner {
    line_num: usize,
}

impl Scanner {
    pub fn new() -> Scanner {
        Scanner { line_num: 0 }
    }

    pub fn scan(input: &str) -> Res<Vec<Instruction>> {
        Scanner::new().scan_src(input)
    }

    fn error<T>(&self, token: &str) -> Res<T> {
        Err(Fault::SyntaxFault {
            line: self.line_num,
            token: token.to_string(),
        })
    }

    pub fn scan_src(&mut self, src: &str) -> Res<Vec<Instruction>> {
        let mut insts = Vec::new();
        for line in src.lines() {
            self.line_num += 1;
            let line = match line.find('#') {
                Some(i) => line[..i].trim(),
                None => line.trim(),
            };
            if !line.is_empty() {
                self.scan_line(line, &mut insts)?;
            }
        }
        Ok(insts)
    }

    // "CPU", "IO 3", "EXIT"
    fn scan_line(&self, input: &str, out: &mut Vec<Instruction>) -> Res<()> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts.as_slice() {
            [mnemonic] => {
                out.push(self.scan_instruction(mnemonic)?);
                Ok(())
            }
            [mnemonic, times] => {
                let inst = self.scan_instruction(mnemonic)?;
                let times = match times.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return self.error(times),
                };
                out.extend(std::iter::repeat(inst).take(times));
                Ok(())
            }
            _ => self.error(input),
        }
    }

    fn scan_instruction(&self, token: &str) -> Res<Instruction> {
        match token.parse::<Instruction>() {
            Ok(inst) => Ok(inst),
            Err(_) => self.error(token),
        }
    }
}
