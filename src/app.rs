//! Batch runner behind the `tickos` binary.
//!
//! ```text
//! tickos [--config FILE] [--algorithm NAME] [--ticks N] PROGRAM[@TICK][:PRIORITY[:CATEGORY]]...
//! ```
//!
//! Each program is compiled and loaded right before tick `TICK + 1`
//! (`@0`, the default, means before the first tick). `CATEGORY` is one of
//! `batch`, `interactive` or `system`.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::asm;
use crate::computer::{Computer, TickReport};
use crate::config::{ConfigError, MachineConfig};
use crate::error::Fault;
use crate::os::pcb::{Category, LoadOptions};

pub const DEFAULT_TICKS: u64 = 20;

pub const USAGE: &str =
    "usage: tickos [--config FILE] [--algorithm NAME] [--ticks N] PROGRAM[@TICK][:PRIORITY[:CATEGORY]]...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramArg {
    pub path: PathBuf,
    pub at_tick: u64,
    pub priority: Option<u32>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub algorithm: Option<String>,
    pub ticks: u64,
    pub programs: Vec<ProgramArg>,
}

#[derive(Debug)]
pub enum AppError {
    Usage(String),
    Io(PathBuf, io::Error),
    Config(ConfigError),
    Fault(Fault),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Usage(msg) => write!(f, "{msg}\n{USAGE}"),
            AppError::Io(path, e) => write!(f, "{}: {e}", path.display()),
            AppError::Config(e) => write!(f, "{e}"),
            AppError::Fault(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Usage(_) => None,
            AppError::Io(_, e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Fault(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<Fault> for AppError {
    fn from(e: Fault) -> Self {
        AppError::Fault(e)
    }
}

fn usage<T>(msg: impl Into<String>) -> Result<T, AppError> {
    Err(AppError::Usage(msg.into()))
}

// "path[@tick][:priority[:category]]"
fn parse_program(arg: &str) -> Result<ProgramArg, AppError> {
    let mut fields = arg.split(':');
    let rest = fields.next().unwrap_or_default();
    let priority = match fields.next() {
        Some(p) => match p.parse::<u32>() {
            Ok(p) => Some(p),
            Err(_) => return usage(format!("bad priority in {arg}")),
        },
        None => None,
    };
    let category = match fields.next() {
        Some(c) => match c.parse::<Category>() {
            Ok(c) => Some(c),
            Err(e) => return usage(format!("{e} in {arg}")),
        },
        None => None,
    };
    if fields.next().is_some() {
        return usage(format!("too many fields in {arg}"));
    }
    let (path, at_tick) = match rest.rsplit_once('@') {
        Some((path, t)) => match t.parse::<u64>() {
            Ok(t) => (path, t),
            Err(_) => return usage(format!("bad tick in {arg}")),
        },
        None => (rest, 0),
    };
    if path.is_empty() {
        return usage(format!("missing program path in {arg}"));
    }
    Ok(ProgramArg {
        path: PathBuf::from(path),
        at_tick,
        priority,
        category,
    })
}

pub fn parse_args<I>(args: I) -> Result<Options, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options {
        config: None,
        algorithm: None,
        ticks: DEFAULT_TICKS,
        programs: Vec::new(),
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(v) => options.config = Some(PathBuf::from(v)),
                None => return usage("--config needs a file"),
            },
            "--algorithm" | "-a" => match args.next() {
                Some(v) => options.algorithm = Some(v),
                None => return usage("--algorithm needs a name"),
            },
            "--ticks" | "-t" => match args.next().map(|v| v.parse::<u64>()) {
                Some(Ok(n)) => options.ticks = n,
                _ => return usage("--ticks needs a number"),
            },
            flag if flag.starts_with('-') => return usage(format!("unknown option {flag}")),
            _ => options.programs.push(parse_program(&arg)?),
        }
    }
    if options.programs.is_empty() {
        return usage("no program given");
    }
    Ok(options)
}

pub fn run(options: &Options) -> Result<Vec<TickReport>, AppError> {
    let config = match &options.config {
        Some(path) => MachineConfig::load(path)?,
        None => MachineConfig::default(),
    };
    let mut computer = Computer::new(&config)?;
    if let Some(name) = &options.algorithm {
        computer.set_algorithm(name)?;
    }

    let mut programs = Vec::new();
    for arg in &options.programs {
        let program = asm::compile_file(&arg.path).map_err(|e| AppError::Io(arg.path.clone(), e))??;
        let load = LoadOptions {
            priority: arg.priority.unwrap_or(LoadOptions::default().priority),
            category: arg.category.unwrap_or_default(),
        };
        if arg.at_tick >= options.ticks {
            log::warn!("{} is scheduled after the last tick and will not run", program.name());
        }
        programs.push((arg.at_tick, program, load));
    }

    let mut reports = Vec::new();
    for tick in 0..options.ticks {
        for (_, program, load) in programs.iter().filter(|(at, _, _)| *at == tick) {
            if let Err(fault) = computer.load_program_with(program.clone(), *load) {
                log::error!("cannot load {}: {}", program.name(), fault);
            }
        }
        let report = computer.tick();
        match report.executed {
            Some(pid) => log::info!("tick {:>4}: pid {}", report.tick, pid),
            None => log::info!("tick {:>4}: idle", report.tick),
        }
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parse_args_test() {
        let options =
            parse_args(args("-a rr --ticks 5 a.asm b.asm@3 c.asm@2:7 d.asm:1 e.asm@4:2:System")).unwrap();
        assert_eq!(Some("rr".to_string()), options.algorithm);
        assert_eq!(5, options.ticks);
        let arg = |path: &str, at_tick, priority, category| ProgramArg {
            path: path.into(),
            at_tick,
            priority,
            category,
        };
        assert_eq!(
            vec![
                arg("a.asm", 0, None, None),
                arg("b.asm", 3, None, None),
                arg("c.asm", 2, Some(7), None),
                arg("d.asm", 0, Some(1), None),
                arg("e.asm", 4, Some(2), Some(Category::System)),
            ],
            options.programs
        );
    }

    #[test]
    fn parse_args_errors_test() {
        assert!(matches!(parse_args(args("")), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(args("--ticks x a")), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(args("--verbose a")), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(args("a@x")), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(args("@3")), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(args("a:2:daemon")), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(args("a:2:batch:x")), Err(AppError::Usage(_))));
    }
}
