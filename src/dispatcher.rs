//! Command table and dispatch.
//!
//! Lookup is a first-match linear scan comparing the inbound mnemonic against
//! each entry over the *entry's* length. An inbound `"BTX"` therefore resolves
//! to an earlier `"BT"` entry; table order is the tie-break. The built-in
//! table has no entry shadowed this way and [`CommandTable::shadowed`] reports
//! any that a custom table introduces.

use once_cell::sync::Lazy;

use crate::commands::{
    parse_hour_minute, parse_hour_minute_second, ArgumentShape, Command, HourMinute,
    HourMinuteSecond,
};
use crate::error::DispatchError;
use crate::operations as op;
use crate::transport::DeviceTransport;

pub type OpResult = Result<(), DispatchError>;

/// Device operation of a table entry, tagged by the argument it takes.
#[derive(Clone, Copy)]
pub enum Operation {
    NoArg(fn(&mut dyn DeviceTransport) -> OpResult),
    Int(fn(&mut dyn DeviceTransport, i64) -> OpResult),
    Float(fn(&mut dyn DeviceTransport, f64) -> OpResult),
    HourMinute(fn(&mut dyn DeviceTransport, HourMinute) -> OpResult),
    HourMinuteSecond(fn(&mut dyn DeviceTransport, HourMinuteSecond) -> OpResult),
}

impl Operation {
    #[must_use]
    pub const fn argument_shape(&self) -> ArgumentShape {
        match self {
            Self::NoArg(_) => ArgumentShape::None,
            Self::Int(_) => ArgumentShape::Int,
            Self::Float(_) => ArgumentShape::Float,
            Self::HourMinute(_) => ArgumentShape::HourMinute,
            Self::HourMinuteSecond(_) => ArgumentShape::HourMinuteSecond,
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation({})", self.argument_shape().as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandTableEntry {
    pub mnemonic: &'static str,
    pub operation: Operation,
}

impl CommandTableEntry {
    #[must_use]
    pub const fn new(mnemonic: &'static str, operation: Operation) -> Self {
        Self {
            mnemonic,
            operation,
        }
    }

    #[must_use]
    pub const fn argument_shape(&self) -> ArgumentShape {
        self.operation.argument_shape()
    }

    /// Prefix equality over this entry's mnemonic length.
    #[must_use]
    pub fn matches(&self, mnemonic: &str) -> bool {
        mnemonic.as_bytes().starts_with(self.mnemonic.as_bytes())
    }
}

const fn entry(mnemonic: &'static str, operation: Operation) -> CommandTableEntry {
    CommandTableEntry::new(mnemonic, operation)
}

/// Order matters: see the module docs.
const BUILTIN_ENTRIES: &[CommandTableEntry] = &[
    entry("BT", Operation::Int(op::set_battery_type)),
    entry("TCC", Operation::Float(op::set_temperature_compensation_coefficient)),
    entry("BC", Operation::Int(op::set_battery_capacity)),
    entry("HVD", Operation::Float(op::set_high_voltage_disconnect)),
    entry("CLV", Operation::Float(op::set_charging_limit_voltage)),
    entry("OVR", Operation::Float(op::set_over_voltage_reconnect)),
    entry("EV", Operation::Float(op::set_equalization_voltage)),
    entry("BV", Operation::Float(op::set_boost_voltage)),
    entry("FV", Operation::Float(op::set_float_voltage)),
    entry("BRV", Operation::Float(op::set_boost_reconnect_voltage)),
    entry("LVR", Operation::Float(op::set_low_voltage_reconnect)),
    entry("UVR", Operation::Float(op::set_under_voltage_recover)),
    entry("UVW", Operation::Float(op::set_under_voltage_warning)),
    entry("LVD", Operation::Float(op::set_low_voltage_disconnect)),
    entry("DLV", Operation::Float(op::set_discharging_limit_voltage)),
    entry("WTL1", Operation::HourMinute(op::set_working_time_length_1)),
    entry("WTL2", Operation::HourMinute(op::set_working_time_length_2)),
    entry("SLON", Operation::HourMinute(op::set_length_of_night)),
    entry("TONT1", Operation::HourMinuteSecond(op::set_turn_on_timing_1)),
    entry("TOFFT1", Operation::HourMinuteSecond(op::set_turn_off_timing_1)),
    entry("TONT2", Operation::HourMinuteSecond(op::set_turn_on_timing_2)),
    entry("TOFFT2", Operation::HourMinuteSecond(op::set_turn_off_timing_2)),
    entry("LCM", Operation::Int(op::set_load_controlling_mode)),
    entry("EQD", Operation::Int(op::set_equalize_duration)),
    entry("BSTD", Operation::Int(op::set_boost_duration)),
    entry("DP", Operation::Int(op::set_discharging_percentage)),
    entry("CP", Operation::Int(op::set_charging_percentage)),
    entry("BMM", Operation::Int(op::set_battery_management_mode)),
    entry("CDON", Operation::NoArg(op::set_charging_device_on)),
    entry("CDOFF", Operation::NoArg(op::set_charging_device_off)),
    entry("LDON", Operation::NoArg(op::set_load_device_on)),
    entry("LDOFF", Operation::NoArg(op::set_load_device_off)),
    entry("OCM", Operation::Int(op::set_output_control_mode)),
    entry("DLC", Operation::Int(op::set_default_load_control)),
    entry("LTM", Operation::Int(op::set_load_test_mode)),
    entry("FLO", Operation::Int(op::force_load)),
    entry("RSD", Operation::NoArg(op::restore_system_defaults)),
    entry("CGES", Operation::NoArg(op::clear_energy_generating_statistics)),
];

static BUILTIN: Lazy<CommandTable> = Lazy::new(CommandTable::builtin);

/// Ordered, read-only command table.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandTableEntry>,
}

impl CommandTable {
    /// Build a table from `entries` in priority order. Entries that can never
    /// be reached are logged.
    #[must_use]
    pub fn new(entries: Vec<CommandTableEntry>) -> Self {
        let table = Self { entries };
        for (earlier, later) in table.shadowed() {
            log::warn!("command table: {later} is unreachable, {earlier} matches it first");
        }
        table
    }

    /// The controller's command set.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_ENTRIES.to_vec())
    }

    /// Process-wide instance of [`builtin`](Self::builtin).
    #[must_use]
    pub fn global() -> &'static Self {
        &BUILTIN
    }

    #[must_use]
    pub fn entries(&self) -> &[CommandTableEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose mnemonic is a prefix of `mnemonic`.
    #[must_use]
    pub fn lookup(&self, mnemonic: &str) -> Option<&CommandTableEntry> {
        self.entries.iter().find(|e| e.matches(mnemonic))
    }

    /// `(earlier, later)` pairs where `later` is unreachable because
    /// `earlier` precedes it and is a prefix of it.
    #[must_use]
    pub fn shadowed(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = Vec::new();
        for (i, later) in self.entries.iter().enumerate() {
            if let Some(earlier) = self.entries[..i].iter().find(|e| e.matches(later.mnemonic)) {
                out.push((earlier.mnemonic, later.mnemonic));
            }
        }
        out
    }

    /// Resolve `command` and run its operation against `transport`.
    ///
    /// Only the parameter field matching the entry's argument shape is read.
    /// Nothing is retried.
    pub fn dispatch(&self, transport: &mut dyn DeviceTransport, command: &Command) -> OpResult {
        log::info!(
            "[CMD] {} i={} f={:.2} c={:?}",
            command.mnemonic(),
            command.int_param,
            command.float_param,
            command.text_param.as_str()
        );
        let Some(entry) = self.lookup(command.mnemonic()) else {
            return Err(DispatchError::UnknownCommand {
                mnemonic: command.mnemonic().to_string(),
            });
        };
        log::debug!(
            "[CMD] {} -> {} ({})",
            command.mnemonic(),
            entry.mnemonic,
            entry.argument_shape().as_str()
        );

        let malformed = || DispatchError::MalformedTimeText {
            mnemonic: entry.mnemonic.to_string(),
            text: command.text_param.to_string(),
        };
        match entry.operation {
            Operation::NoArg(f) => f(transport),
            Operation::Int(f) => f(transport, command.int_param),
            Operation::Float(f) => f(transport, command.float_param),
            Operation::HourMinute(f) => {
                let hm = parse_hour_minute(command.text_param.as_str()).ok_or_else(malformed)?;
                f(transport, hm)
            }
            Operation::HourMinuteSecond(f) => {
                let hms =
                    parse_hour_minute_second(command.text_param.as_str()).ok_or_else(malformed)?;
                f(transport, hms)
            }
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Dispatch against the built-in table, logging the outcome.
pub fn dispatch(transport: &mut dyn DeviceTransport, command: &Command) -> OpResult {
    let res = CommandTable::global().dispatch(transport, command);
    if let Err(e) = &res {
        log::error!("[CMD] {} failed: {e}", command.mnemonic());
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDevice;
    use crate::registers as reg;

    #[test]
    fn builtin_has_no_shadowed_entries() {
        let table = CommandTable::builtin();
        assert!(table.shadowed().is_empty());
        assert_eq!(table.len(), BUILTIN_ENTRIES.len());
    }

    #[test]
    fn lookup_uses_entry_length() {
        let table = CommandTable::builtin();
        assert_eq!(table.lookup("HVD").map(|e| e.mnemonic), Some("HVD"));
        assert_eq!(table.lookup("HVDX").map(|e| e.mnemonic), Some("HVD"));
        assert!(table.lookup("HV").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn shadowed_reports_prefix_entries() {
        let table = CommandTable::new(vec![
            entry("BT", Operation::NoArg(|_| Ok(()))),
            entry("BTX", Operation::NoArg(|_| Ok(()))),
        ]);
        assert_eq!(table.shadowed(), vec![("BT", "BTX")]);
    }

    #[test]
    fn float_command_writes_scaled_word() {
        let mut dev = MockDevice::new();
        let cmd = Command::new("BV").unwrap().with_float(14.4);
        CommandTable::builtin().dispatch(&mut dev, &cmd).unwrap();
        assert_eq!(dev.holding(reg::BOOST_VOLTAGE), Some(1440));
    }

    #[test]
    fn unknown_command_touches_nothing() {
        let mut dev = MockDevice::new();
        let cmd = Command::new("NOPE").unwrap();
        let err = CommandTable::builtin().dispatch(&mut dev, &cmd).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand { .. }));
        assert!(dev.journal().is_empty());
    }

    #[test]
    fn coil_command() {
        let mut dev = MockDevice::new();
        let cmd = Command::new("LDON").unwrap();
        dispatch(&mut dev, &cmd).unwrap();
        assert_eq!(dev.coil(reg::COIL_MANUAL_LOAD), Some(true));
    }
}
