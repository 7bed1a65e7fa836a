use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::BridgeError;
use crate::toml_helpers::config_parse_error;

const DEFAULT_PORT: &str = "/dev/ttyUSB0";
const DEFAULT_BAUD: u32 = 115_200;
const DEFAULT_SLAVE_ID: u8 = crate::registers::LANDSTAR_1024B_ID;
const DEFAULT_CONTROLLER_ID: &str = "1";
const DEFAULT_REALTIME_SECS: u64 = 5;
const DEFAULT_OTHER_SECS: u64 = 10;

/// Topic root the controller publishes under.
pub const TOPIC_ROOT: &str = "LS1024B";

/// Register map revision spoken by the controller firmware.
///
/// Older LS1024B firmware answers `illegal data address` for anything from
/// 0x3112 on in the real-time block and past 0x9009 in the settings block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVersion {
    #[default]
    Legacy,
    Extended,
}

impl ProtocolVersion {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Extended => "extended",
        }
    }

    /// Words read from the real-time block at 0x3100.
    #[must_use]
    pub const fn realtime_words(&self) -> u16 {
        match self {
            Self::Legacy => 0x12,
            Self::Extended => 0x13,
        }
    }

    /// Words read from the settings block at 0x9000.
    #[must_use]
    pub const fn settings_words(&self) -> u16 {
        match self {
            Self::Legacy => 0x0A,
            Self::Extended => 0x0F,
        }
    }

    /// SoC, remote battery temperature and battery real rated power.
    #[must_use]
    pub const fn has_extra_realtime_registers(&self) -> bool {
        matches!(self, Self::Extended)
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "v1" => Ok(Self::Legacy),
            "extended" | "v2" => Ok(Self::Extended),
            other => Err(format!("unknown protocol version: {other}")),
        }
    }
}

/// Unit temperatures are reported in. The device itself always answers in Celsius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "Celsius",
            Self::Fahrenheit => "Fahrenheit",
        }
    }

    #[must_use]
    pub const fn is_fahrenheit(&self) -> bool {
        matches!(self, Self::Fahrenheit)
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit: {other}")),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub ls1024b_port: String,
    pub ls1024b_baud: u32,
    pub ls1024b_slave_id: u8,
    pub ls1024b_controller_id: String,
    pub ls1024b_realtime_secs: u64,
    pub ls1024b_other_secs: u64,
    pub ls1024b_protocol: ProtocolVersion,
    pub ls1024b_temp_unit: TemperatureUnit,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        let ls1024b_port =
            std::env::var("LS1024B_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let ls1024b_controller_id = std::env::var("LS1024B_CONTROLLER_ID")
            .unwrap_or_else(|_| DEFAULT_CONTROLLER_ID.to_string());
        Self {
            ls1024b_port,
            ls1024b_baud: env_or("LS1024B_BAUD", DEFAULT_BAUD),
            ls1024b_slave_id: env_or("LS1024B_SLAVE_ID", DEFAULT_SLAVE_ID),
            ls1024b_controller_id,
            ls1024b_realtime_secs: env_or("LS1024B_REALTIME_SECS", DEFAULT_REALTIME_SECS),
            ls1024b_other_secs: env_or("LS1024B_OTHER_SECS", DEFAULT_OTHER_SECS),
            ls1024b_protocol: env_or("LS1024B_PROTOCOL", ProtocolVersion::default()),
            ls1024b_temp_unit: env_or("LS1024B_TEMP_UNIT", TemperatureUnit::default()),
        }
    }
}

/// Global config loaded once from environment at first access.
pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Convenience accessor
pub fn config() -> &'static Config {
    &GLOBAL_CONFIG
}

/// Bridge settings as a TOML document. Every key is optional.
///
/// ```toml
/// controller_id = "garage"
/// protocol = "extended"
/// temperature_unit = "celsius"
///
/// [serial]
/// port = "/dev/ttyUSB1"
/// baud = 115200
/// slave_id = 1
///
/// [poll]
/// realtime_secs = 5
/// other_secs = 60
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub controller_id: String,
    pub protocol: ProtocolVersion,
    pub temperature_unit: TemperatureUnit,
    pub serial: SerialSettings,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSettings {
    pub port: String,
    pub baud: u32,
    pub slave_id: u8,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PollSettings {
    pub realtime_secs: u64,
    pub other_secs: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
            slave_id: DEFAULT_SLAVE_ID,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            realtime_secs: DEFAULT_REALTIME_SECS,
            other_secs: DEFAULT_OTHER_SECS,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            controller_id: DEFAULT_CONTROLLER_ID.to_string(),
            protocol: ProtocolVersion::default(),
            temperature_unit: TemperatureUnit::default(),
            serial: SerialSettings::default(),
            poll: PollSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a bridge TOML document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, BridgeError> {
        let cfg: Self = toml::from_str(s).map_err(|e| config_parse_error("bridge.toml", s, &e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and parse a bridge TOML document from a filesystem path.
    pub fn from_path(path: &Path) -> Result<Self, BridgeError> {
        let s = fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("read {}: {e}", path.display()))
        })?;
        Self::from_str(&s)
    }

    /// Snapshot of the process-wide environment config.
    #[must_use]
    pub fn from_env() -> Self {
        let c = config();
        Self {
            controller_id: c.ls1024b_controller_id.clone(),
            protocol: c.ls1024b_protocol,
            temperature_unit: c.ls1024b_temp_unit,
            serial: SerialSettings {
                port: c.ls1024b_port.clone(),
                baud: c.ls1024b_baud,
                slave_id: c.ls1024b_slave_id,
            },
            poll: PollSettings {
                realtime_secs: c.ls1024b_realtime_secs,
                other_secs: c.ls1024b_other_secs,
            },
        }
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.controller_id.trim().is_empty() {
            return Err(BridgeError::Config("controller_id is empty".into()));
        }
        if self.controller_id.contains(['/', '+', '#']) {
            return Err(BridgeError::Config(format!(
                "controller_id {:?} contains a topic wildcard or separator",
                self.controller_id
            )));
        }
        if self.poll.realtime_secs == 0 || self.poll.other_secs == 0 {
            return Err(BridgeError::Config("poll intervals must be non-zero".into()));
        }
        if self.serial.slave_id == 0 || self.serial.slave_id > 247 {
            return Err(BridgeError::Config(format!(
                "slave_id out of range: {}",
                self.serial.slave_id
            )));
        }
        Ok(())
    }

    /// Topic telemetry is published under, e.g. `LS1024B/1`.
    #[must_use]
    pub fn publish_topic(&self) -> String {
        format!("{TOPIC_ROOT}/{}", self.controller_id)
    }

    /// Topic inbound commands arrive on, e.g. `LS1024B/1/COMMAND`.
    #[must_use]
    pub fn command_topic(&self) -> String {
        format!("{TOPIC_ROOT}/{}/COMMAND", self.controller_id)
    }

    /// Poll loop tick: the smaller of the two intervals.
    #[must_use]
    pub fn tick_secs(&self) -> u64 {
        self.poll.realtime_secs.min(self.poll.other_secs)
    }
}

impl std::str::FromStr for BridgeConfig {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_takes_defaults() {
        let cfg = BridgeConfig::from_str("").expect("empty config");
        assert_eq!(cfg, BridgeConfig::default());
        assert_eq!(cfg.command_topic(), "LS1024B/1/COMMAND");
        assert_eq!(cfg.tick_secs(), 5);
    }

    #[test]
    fn protocol_and_unit_parse_from_text() {
        assert_eq!("V2".parse::<ProtocolVersion>(), Ok(ProtocolVersion::Extended));
        assert_eq!(" legacy ".parse::<ProtocolVersion>(), Ok(ProtocolVersion::Legacy));
        assert!("v3".parse::<ProtocolVersion>().is_err());
        assert_eq!("C".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = BridgeConfig::from_str("[poll]\nrealtime_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }
}
