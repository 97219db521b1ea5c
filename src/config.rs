//! Machine configuration, read from JSON. Every field has a default, so a
//! partial file (or `{}`) is a valid configuration.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::os::loader::Placement;
use crate::os::sched::AlgorithmKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Number of memory cells.
    pub memory_size: usize,
    /// Ticks per second when running in the background.
    pub clock_speed: f64,
    /// Service time in ticks, one entry per IO device.
    pub device_timings: Vec<u32>,
    pub overclock: bool,
    /// Seed for the IO device picker.
    pub seed: u64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            memory_size: 30,
            clock_speed: 1.0,
            device_timings: vec![1, 2],
            overclock: true,
            seed: 0x5EED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub algorithm: AlgorithmKind,
    pub placement: Placement,
    /// Round Robin time slice in ticks.
    pub quantum: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            algorithm: AlgorithmKind::Fcfs,
            placement: Placement::FirstFit,
            quantum: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub hardware: HardwareConfig,
    pub kernel: KernelConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {e}"),
            ConfigError::Parse(e) => write!(f, "cannot parse config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl MachineConfig {
    pub fn from_json_str(s: &str) -> Result<MachineConfig, ConfigError> {
        let config: MachineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<MachineConfig, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hardware.memory_size == 0 {
            return Err(ConfigError::Invalid("memory_size must be at least 1".into()));
        }
        let speed = self.hardware.clock_speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "clock_speed must be a positive number, got {speed}"
            )));
        }
        if self.kernel.quantum == 0 {
            return Err(ConfigError::Invalid("quantum must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults_test() {
        let config =
            MachineConfig::from_json_str(r#"{"kernel": {"algorithm": "RR", "placement": "best"}}"#)
                .unwrap();
        assert_eq!(AlgorithmKind::Rr, config.kernel.algorithm);
        assert_eq!(Placement::BestFit, config.kernel.placement);
        assert_eq!(2, config.kernel.quantum);
        assert_eq!(HardwareConfig::default(), config.hardware);
    }

    #[test]
    fn invalid_values_test() {
        assert!(matches!(
            MachineConfig::from_json_str(r#"{"hardware": {"memory_size": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MachineConfig::from_json_str(r#"{"hardware": {"clock_speed": -1.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MachineConfig::from_json_str(r#"{"kernel": {"quantum": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MachineConfig::from_json_str(r#"{"kernel": {"algorithm": "LOTTERY"}}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
