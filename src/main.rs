use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use log::{Level, LevelFilter, Log, Metadata, Record};

use tickos::app;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => " WARN",
            Level::Info => " INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let _ = writeln!(io::stderr().lock(), "[{}] {}", tag, record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

// LOG=error|warn|info|debug|trace, default info
fn init_logger() {
    let level = env::var("LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    init_logger();
    let options = match app::parse_args(env::args().skip(1)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    match app::run(&options) {
        Ok(reports) => {
            let faults: usize = reports.iter().map(|r| r.faults.len()).sum();
            if faults > 0 {
                log::warn!("{} faults during {} ticks", faults, reports.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("tickos: {}", e);
            ExitCode::FAILURE
        }
    }
}
