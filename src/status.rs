//! Decoding of the three real-time status words (input registers 0x3200..=0x3202).
//!
//! Every multi-bit range maps reserved patterns to an explicit `Unknown`
//! carrying the raw bits; nothing silently falls back to the first case.

use serde::{Serialize, Serializer};

/// Text label of a decoded status field, as published.
pub trait StatusLabel {
    fn label(&self) -> &'static str;
}

fn serialize_label<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: StatusLabel,
{
    serializer.serialize_str(value.label())
}

const fn bit(word: u16, n: u32) -> bool {
    (word >> n) & 0x1 != 0
}

#[allow(clippy::cast_possible_truncation)]
const fn bits(word: u16, shift: u32, mask: u16) -> u8 {
    ((word >> shift) & mask) as u8
}

// ---------------------------------------------------------------------------
// battery status, 0x3200

/// D3-D0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryVoltageStatus {
    Normal,
    OverVoltage,
    UnderVoltage,
    LowVoltageDisconnect,
    Fault,
    Unknown(u8),
}

impl StatusLabel for BatteryVoltageStatus {
    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::OverVoltage => "Over Voltage",
            Self::UnderVoltage => "Under Voltage",
            Self::LowVoltageDisconnect => "Low Voltage Disconnect",
            Self::Fault => "Fault",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// D7-D4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryTemperatureStatus {
    Normal,
    OverTemperature,
    LowTemperature,
    Unknown(u8),
}

impl StatusLabel for BatteryTemperatureStatus {
    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::OverTemperature => "Over Temperature",
            Self::LowTemperature => "Low Temperature",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// D8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerResistance {
    Normal,
    Abnormal,
}

impl StatusLabel for InnerResistance {
    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Abnormal => "Abnormal",
        }
    }
}

/// D15: rated voltage identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identification {
    Correct,
    Incorrect,
}

impl StatusLabel for Identification {
    fn label(&self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    #[serde(serialize_with = "serialize_label")]
    pub voltage: BatteryVoltageStatus,
    #[serde(serialize_with = "serialize_label")]
    pub temperature: BatteryTemperatureStatus,
    #[serde(serialize_with = "serialize_label")]
    pub inner_resistance: InnerResistance,
    #[serde(serialize_with = "serialize_label")]
    pub identification: Identification,
}

#[must_use]
pub fn decode_battery_status(word: u16) -> BatteryStatus {
    let voltage = match bits(word, 0, 0x0F) {
        0x00 => BatteryVoltageStatus::Normal,
        0x01 => BatteryVoltageStatus::OverVoltage,
        0x02 => BatteryVoltageStatus::UnderVoltage,
        0x03 => BatteryVoltageStatus::LowVoltageDisconnect,
        0x04 => BatteryVoltageStatus::Fault,
        other => BatteryVoltageStatus::Unknown(other),
    };
    let temperature = match bits(word, 4, 0x0F) {
        0x00 => BatteryTemperatureStatus::Normal,
        0x01 => BatteryTemperatureStatus::OverTemperature,
        0x02 => BatteryTemperatureStatus::LowTemperature,
        other => BatteryTemperatureStatus::Unknown(other),
    };
    BatteryStatus {
        voltage,
        temperature,
        inner_resistance: if bit(word, 8) {
            InnerResistance::Abnormal
        } else {
            InnerResistance::Normal
        },
        identification: if bit(word, 15) {
            Identification::Incorrect
        } else {
            Identification::Correct
        },
    }
}

// ---------------------------------------------------------------------------
// charging equipment status, 0x3201

/// D15-D14
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingInputVoltage {
    Normal,
    NoPowerConnected,
    HigherVoltageInput,
    InputVoltageError,
}

impl StatusLabel for ChargingInputVoltage {
    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::NoPowerConnected => "No Power Connected",
            Self::HigherVoltageInput => "Higher Voltage Input",
            Self::InputVoltageError => "Input Voltage Error",
        }
    }
}

/// D3-D2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingPhase {
    NotCharging,
    Float,
    Boost,
    Equalization,
}

impl StatusLabel for ChargingPhase {
    fn label(&self) -> &'static str {
        match self {
            Self::NotCharging => "Not Charging",
            Self::Float => "Float",
            Self::Boost => "Boost",
            Self::Equalization => "Equalization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingStatus {
    #[serde(rename = "status", serialize_with = "serialize_label")]
    pub phase: ChargingPhase,
    pub is_normal: bool,
    pub is_running: bool,
    #[serde(serialize_with = "serialize_label")]
    pub input_voltage: ChargingInputVoltage,
    #[serde(rename = "MOSFETShort")]
    pub charging_mosfet_short: bool,
    #[serde(rename = "someMOSFETShort")]
    pub some_mosfet_short: bool,
    #[serde(rename = "antiReverseMOSFETShort")]
    pub anti_reverse_mosfet_short: bool,
    pub input_is_over_current: bool,
    pub load_is_over_current: bool,
    pub load_is_short: bool,
    #[serde(rename = "loadMOSFETIsShort")]
    pub load_mosfet_is_short: bool,
    pub pv_input_is_short: bool,
}

#[must_use]
pub fn decode_charging_status(word: u16) -> ChargingStatus {
    let input_voltage = match bits(word, 14, 0x03) {
        0x00 => ChargingInputVoltage::Normal,
        0x01 => ChargingInputVoltage::NoPowerConnected,
        0x02 => ChargingInputVoltage::HigherVoltageInput,
        _ => ChargingInputVoltage::InputVoltageError,
    };
    let phase = match bits(word, 2, 0x03) {
        0x00 => ChargingPhase::NotCharging,
        0x01 => ChargingPhase::Float,
        0x02 => ChargingPhase::Boost,
        _ => ChargingPhase::Equalization,
    };
    ChargingStatus {
        phase,
        is_normal: !bit(word, 1),
        is_running: bit(word, 0),
        input_voltage,
        charging_mosfet_short: bit(word, 13),
        some_mosfet_short: bit(word, 12),
        anti_reverse_mosfet_short: bit(word, 11),
        input_is_over_current: bit(word, 10),
        load_is_over_current: bit(word, 9),
        load_is_short: bit(word, 8),
        load_mosfet_is_short: bit(word, 7),
        pv_input_is_short: bit(word, 4),
    }
}

// ---------------------------------------------------------------------------
// discharging equipment status, 0x3202

/// D15-D14
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DischargingInputVoltage {
    Normal,
    Low,
    High,
    NoAccess,
}

impl StatusLabel for DischargingInputVoltage {
    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Low => "Low",
            Self::High => "High",
            Self::NoAccess => "No Access",
        }
    }
}

/// D13-D12
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPower {
    Light,
    Moderate,
    Rated,
    Overload,
}

impl StatusLabel for OutputPower {
    fn label(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Rated => "Rated",
            Self::Overload => "Overload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargingStatus {
    pub is_normal: bool,
    pub is_running: bool,
    #[serde(rename = "inputVoltageStatus", serialize_with = "serialize_label")]
    pub input_voltage: DischargingInputVoltage,
    #[serde(serialize_with = "serialize_label")]
    pub output_power: OutputPower,
    pub short_circuit: bool,
    pub unable_to_discharge: bool,
    pub unable_to_stop_discharging: bool,
    pub output_voltage_abnormal: bool,
    pub input_overpressure: bool,
    pub high_voltage_side_short: bool,
    pub boost_overpressure: bool,
    pub output_overpressure: bool,
}

#[must_use]
pub fn decode_discharging_status(word: u16) -> DischargingStatus {
    let input_voltage = match bits(word, 14, 0x03) {
        0x00 => DischargingInputVoltage::Normal,
        0x01 => DischargingInputVoltage::Low,
        0x02 => DischargingInputVoltage::High,
        _ => DischargingInputVoltage::NoAccess,
    };
    let output_power = match bits(word, 12, 0x03) {
        0x00 => OutputPower::Light,
        0x01 => OutputPower::Moderate,
        0x02 => OutputPower::Rated,
        _ => OutputPower::Overload,
    };
    DischargingStatus {
        is_normal: !bit(word, 1),
        is_running: bit(word, 0),
        input_voltage,
        output_power,
        short_circuit: bit(word, 11),
        unable_to_discharge: bit(word, 10),
        unable_to_stop_discharging: bit(word, 9),
        output_voltage_abnormal: bit(word, 8),
        input_overpressure: bit(word, 7),
        high_voltage_side_short: bit(word, 6),
        boost_overpressure: bit(word, 5),
        output_overpressure: bit(word, 4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_battery_word_is_all_normal() {
        let s = decode_battery_status(0x0000);
        assert_eq!(s.voltage.label(), "Normal");
        assert_eq!(s.temperature.label(), "Normal");
        assert_eq!(s.inner_resistance.label(), "Normal");
        assert_eq!(s.identification.label(), "Correct");
    }

    #[test]
    fn bit_15_flags_wrong_identification() {
        let s = decode_battery_status(0x8000);
        assert_eq!(s.identification, Identification::Incorrect);
        assert_eq!(s.voltage, BatteryVoltageStatus::Normal);
    }

    #[test]
    fn reserved_patterns_are_unknown() {
        let s = decode_battery_status(0x0037);
        assert_eq!(s.voltage, BatteryVoltageStatus::Unknown(7));
        assert_eq!(s.temperature, BatteryTemperatureStatus::Unknown(3));
        assert_eq!(s.voltage.label(), "Unknown");
    }

    #[test]
    fn charging_word_fields() {
        // D15-14 = 01, D13, D3-2 = 10 (boost), D0 running
        let s = decode_charging_status(0b0110_0000_0000_1001);
        assert_eq!(s.input_voltage, ChargingInputVoltage::NoPowerConnected);
        assert!(s.charging_mosfet_short);
        assert!(!s.some_mosfet_short);
        assert_eq!(s.phase, ChargingPhase::Boost);
        assert!(s.is_running);
        assert!(s.is_normal);
    }

    #[test]
    fn discharging_word_fields() {
        // D15-14 = 11, D13-12 = 11, D11, D1 fault
        let s = decode_discharging_status(0b1111_1000_0000_0010);
        assert_eq!(s.input_voltage, DischargingInputVoltage::NoAccess);
        assert_eq!(s.output_power, OutputPower::Overload);
        assert!(s.short_circuit);
        assert!(!s.is_normal);
        assert!(!s.is_running);
    }
}
