//! Read path: the register blocks the bridge polls and publishes.
//!
//! Each reader issues one or a few block reads and decodes the words through
//! [`RegisterDescriptor`]s. Analog values are rounded to two decimals.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::codec::{round_to, unpack_hour_minute, RegisterDescriptor};
use crate::config::{BridgeConfig, ProtocolVersion, TemperatureUnit};
use crate::error::TransportError;
use crate::registers::{self as reg, Address};
use crate::status::{
    decode_battery_status, decode_charging_status, decode_discharging_status, BatteryStatus,
    ChargingStatus, DischargingStatus,
};
use crate::transport::DeviceTransport;

/// A run of words read from `base`.
struct Block {
    base: Address,
    words: Vec<u16>,
    unit: TemperatureUnit,
}

impl Block {
    fn input(
        t: &mut dyn DeviceTransport,
        base: Address,
        count: u16,
        unit: TemperatureUnit,
    ) -> Result<Self, TransportError> {
        let words = t.read_input_registers(base, count)?;
        Self::checked(base, count, words, unit)
    }

    fn holding(
        t: &mut dyn DeviceTransport,
        base: Address,
        count: u16,
        unit: TemperatureUnit,
    ) -> Result<Self, TransportError> {
        let words = t.read_holding_registers(base, count)?;
        Self::checked(base, count, words, unit)
    }

    fn checked(
        base: Address,
        count: u16,
        words: Vec<u16>,
        unit: TemperatureUnit,
    ) -> Result<Self, TransportError> {
        if words.len() < usize::from(count) {
            return Err(TransportError::Protocol(format!(
                "short read at 0x{base:04X}: {} of {count} words",
                words.len()
            )));
        }
        Ok(Self { base, words, unit })
    }

    fn value(&self, d: &RegisterDescriptor) -> Result<f64, TransportError> {
        d.decode(self.base, &self.words, self.unit)
            .map(|v| round_to(v, 2))
    }

    fn word(&self, addr: Address) -> Result<u16, TransportError> {
        addr.checked_sub(self.base)
            .and_then(|i| self.words.get(usize::from(i)))
            .copied()
            .ok_or_else(|| {
                TransportError::Protocol(format!(
                    "0x{addr:04X} outside block at 0x{:04X}",
                    self.base
                ))
            })
    }

    fn hour_minute(&self, addr: Address) -> Result<String, TransportError> {
        let (h, m) = unpack_hour_minute(self.word(addr)?);
        Ok(format!("{h:02}:{m:02}"))
    }

    /// Seconds, minutes, hours in three consecutive registers.
    fn timing(&self, addr: Address) -> Result<String, TransportError> {
        let s = self.word(addr)?;
        let m = self.word(addr + 1)?;
        let h = self.word(addr + 2)?;
        Ok(format!("{h:02}:{m:02}:{s:02}"))
    }
}

// ---------------------------------------------------------------------------
// rated data (input 0x3000)

const PV_RATED_VOLTAGE: RegisterDescriptor = RegisterDescriptor::fixed("pv rated voltage", 0x3000);
const PV_RATED_CURRENT: RegisterDescriptor = RegisterDescriptor::fixed("pv rated current", 0x3001);
const PV_RATED_POWER: RegisterDescriptor = RegisterDescriptor::wide("pv rated power", 0x3002);
const BATTERY_RATED_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("battery rated voltage", 0x3004);
const BATTERY_RATED_CURRENT: RegisterDescriptor =
    RegisterDescriptor::fixed("battery rated current", 0x3005);
const BATTERY_RATED_POWER: RegisterDescriptor =
    RegisterDescriptor::wide("battery rated power", 0x3006);
const RATED_LOAD_CURRENT: RegisterDescriptor =
    RegisterDescriptor::fixed("rated load current", reg::RATED_LOAD_CURRENT);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedData {
    pub pv_array_rated_voltage: f64,
    pub pv_array_rated_current: f64,
    pub pv_array_rated_power: f64,
    pub battery_rated_voltage: f64,
    pub battery_rated_current: f64,
    pub battery_rated_power: f64,
    pub charging_mode: &'static str,
    /// Outside the 9-word block. Extended protocol only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rated_current_of_load: Option<f64>,
}

#[must_use]
pub const fn charging_mode_label(code: u16) -> &'static str {
    match code {
        0x00 => "Connect/Disconnect",
        0x01 => "PWM",
        0x02 => "MPPT",
        _ => "Unknown",
    }
}

/// Legacy firmware answers `illegal data address` past the 9-word block, so
/// 0x300E is only read for [`ProtocolVersion::Extended`]. A failure there
/// leaves that one field empty.
pub fn read_rated_data(
    t: &mut dyn DeviceTransport,
    protocol: ProtocolVersion,
) -> Result<RatedData, TransportError> {
    let unit = TemperatureUnit::Celsius;
    let b = Block::input(t, reg::RATED_DATA, reg::RATED_DATA_WORDS, unit)?;
    let rated_current_of_load = if protocol == ProtocolVersion::Extended {
        logged(
            "rated load current",
            Block::input(t, reg::RATED_LOAD_CURRENT, 1, unit)
                .and_then(|load| load.value(&RATED_LOAD_CURRENT)),
        )
    } else {
        None
    };
    Ok(RatedData {
        pv_array_rated_voltage: b.value(&PV_RATED_VOLTAGE)?,
        pv_array_rated_current: b.value(&PV_RATED_CURRENT)?,
        pv_array_rated_power: b.value(&PV_RATED_POWER)?,
        battery_rated_voltage: b.value(&BATTERY_RATED_VOLTAGE)?,
        battery_rated_current: b.value(&BATTERY_RATED_CURRENT)?,
        battery_rated_power: b.value(&BATTERY_RATED_POWER)?,
        charging_mode: charging_mode_label(b.word(0x3008)?),
        rated_current_of_load,
    })
}

// ---------------------------------------------------------------------------
// real-time data (input 0x3100)

const PV_VOLTAGE: RegisterDescriptor = RegisterDescriptor::fixed("pv voltage", 0x3100);
const PV_CURRENT: RegisterDescriptor = RegisterDescriptor::fixed("pv current", 0x3101);
const PV_POWER: RegisterDescriptor = RegisterDescriptor::wide("pv power", 0x3102);
const BATTERY_VOLTAGE: RegisterDescriptor = RegisterDescriptor::fixed("battery voltage", 0x3104);
const BATTERY_CURRENT: RegisterDescriptor = RegisterDescriptor::fixed("battery current", 0x3105);
const BATTERY_POWER: RegisterDescriptor = RegisterDescriptor::wide("battery power", 0x3106);
const LOAD_VOLTAGE: RegisterDescriptor = RegisterDescriptor::fixed("load voltage", 0x310C);
const LOAD_CURRENT: RegisterDescriptor = RegisterDescriptor::fixed("load current", 0x310D);
const LOAD_POWER: RegisterDescriptor = RegisterDescriptor::wide("load power", 0x310E);
const BATTERY_TEMP: RegisterDescriptor = RegisterDescriptor::temperature("battery temp", 0x3110);
const CASE_TEMP: RegisterDescriptor = RegisterDescriptor::temperature("case temp", 0x3111);
const COMPONENTS_TEMP: RegisterDescriptor =
    RegisterDescriptor::temperature("components temp", 0x3112);
const REMOTE_BATTERY_TEMP: RegisterDescriptor =
    RegisterDescriptor::temperature("remote battery temp", reg::REMOTE_BATTERY_TEMPERATURE);
const BATTERY_REAL_RATED_POWER: RegisterDescriptor =
    RegisterDescriptor::fixed("battery real rated power", reg::BATTERY_REAL_RATED_POWER);

/// Words covering SoC through battery real rated power.
const REALTIME_EXTRA_WORDS: u16 = reg::BATTERY_REAL_RATED_POWER - reg::BATTERY_SOC + 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeData {
    pub pv_array_voltage: f64,
    pub pv_array_current: f64,
    pub pv_array_power: f64,
    pub battery_voltage: f64,
    pub battery_current: f64,
    pub battery_power: f64,
    pub load_voltage: f64,
    pub load_current: f64,
    pub load_power: f64,
    pub battery_temp: f64,
    pub case_temp: f64,
    /// Past the end of the legacy block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components_temp: Option<f64>,
    /// Percent. Extended protocol only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_soc: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_battery_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_real_rated_power: Option<f64>,
    pub temperature_unit: &'static str,
}

pub fn read_realtime_data(
    t: &mut dyn DeviceTransport,
    protocol: ProtocolVersion,
    unit: TemperatureUnit,
) -> Result<RealTimeData, TransportError> {
    let b = Block::input(t, reg::REALTIME_DATA, protocol.realtime_words(), unit)?;
    let mut data = RealTimeData {
        pv_array_voltage: b.value(&PV_VOLTAGE)?,
        pv_array_current: b.value(&PV_CURRENT)?,
        pv_array_power: b.value(&PV_POWER)?,
        battery_voltage: b.value(&BATTERY_VOLTAGE)?,
        battery_current: b.value(&BATTERY_CURRENT)?,
        battery_power: b.value(&BATTERY_POWER)?,
        load_voltage: b.value(&LOAD_VOLTAGE)?,
        load_current: b.value(&LOAD_CURRENT)?,
        load_power: b.value(&LOAD_POWER)?,
        battery_temp: b.value(&BATTERY_TEMP)?,
        case_temp: b.value(&CASE_TEMP)?,
        components_temp: None,
        battery_soc: None,
        remote_battery_temperature: None,
        battery_real_rated_power: None,
        temperature_unit: unit.as_str(),
    };
    if protocol.has_extra_realtime_registers() {
        data.components_temp = Some(b.value(&COMPONENTS_TEMP)?);
        // the base fields stand on their own if the extra registers fail
        if let Some(x) = logged(
            "real-time extra registers",
            Block::input(t, reg::BATTERY_SOC, REALTIME_EXTRA_WORDS, unit),
        ) {
            data.battery_soc = x.word(reg::BATTERY_SOC).ok();
            data.remote_battery_temperature = x.value(&REMOTE_BATTERY_TEMP).ok();
            data.battery_real_rated_power = x.value(&BATTERY_REAL_RATED_POWER).ok();
        }
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// real-time status (input 0x3200)

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeStatus {
    pub battery_status_value: u16,
    pub charging_status_value: u16,
    pub discharging_status_value: u16,
    pub battery_status: BatteryStatus,
    pub charging_status: ChargingStatus,
    pub discharging_status: DischargingStatus,
}

impl RealTimeStatus {
    #[must_use]
    pub fn decode(battery: u16, charging: u16, discharging: u16) -> Self {
        Self {
            battery_status_value: battery,
            charging_status_value: charging,
            discharging_status_value: discharging,
            battery_status: decode_battery_status(battery),
            charging_status: decode_charging_status(charging),
            discharging_status: decode_discharging_status(discharging),
        }
    }
}

pub fn read_realtime_status(t: &mut dyn DeviceTransport) -> Result<RealTimeStatus, TransportError> {
    let b = Block::input(
        t,
        reg::REALTIME_STATUS,
        reg::REALTIME_STATUS_WORDS,
        TemperatureUnit::Celsius,
    )?;
    Ok(RealTimeStatus::decode(
        b.word(reg::REALTIME_STATUS)?,
        b.word(reg::REALTIME_STATUS + 1)?,
        b.word(reg::REALTIME_STATUS + 2)?,
    ))
}

// ---------------------------------------------------------------------------
// settings (holding 0x9000..)

const TEMP_COMPENSATION: RegisterDescriptor =
    RegisterDescriptor::fixed("temp compensation coeff", reg::TEMP_COMPENSATION_COEFFICIENT);
const HIGH_VOLTAGE_DISCONNECT: RegisterDescriptor =
    RegisterDescriptor::fixed("high voltage disconnect", reg::HIGH_VOLTAGE_DISCONNECT);
const CHARGING_LIMIT_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("charging limit voltage", reg::CHARGING_LIMIT_VOLTAGE);
const OVER_VOLTAGE_RECONNECT: RegisterDescriptor =
    RegisterDescriptor::fixed("over voltage reconnect", reg::OVER_VOLTAGE_RECONNECT);
const EQUALIZATION_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("equalization voltage", reg::EQUALIZATION_VOLTAGE);
const BOOST_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("boost voltage", reg::BOOST_VOLTAGE);
const FLOAT_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("float voltage", reg::FLOAT_VOLTAGE);
const BOOST_RECONNECT_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("boost reconnect voltage", reg::BOOST_RECONNECT_VOLTAGE);
const LOW_VOLTAGE_RECONNECT: RegisterDescriptor =
    RegisterDescriptor::fixed("low voltage reconnect", reg::LOW_VOLTAGE_RECONNECT);
const UNDER_VOLTAGE_RECOVER: RegisterDescriptor =
    RegisterDescriptor::fixed("under voltage recover", reg::UNDER_VOLTAGE_RECOVER);
const UNDER_VOLTAGE_WARNING: RegisterDescriptor =
    RegisterDescriptor::fixed("under voltage warning", reg::UNDER_VOLTAGE_WARNING);
const LOW_VOLTAGE_DISCONNECT: RegisterDescriptor =
    RegisterDescriptor::fixed("low voltage disconnect", reg::LOW_VOLTAGE_DISCONNECT);
const DISCHARGING_LIMIT_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("discharging limit voltage", reg::DISCHARGING_LIMIT_VOLTAGE);

const BATTERY_TEMP_UPPER: RegisterDescriptor =
    RegisterDescriptor::temperature("battery temp warning upper", 0x9017);
const BATTERY_TEMP_LOWER: RegisterDescriptor =
    RegisterDescriptor::temperature("battery temp warning lower", 0x9018);
const INNER_TEMP_UPPER: RegisterDescriptor =
    RegisterDescriptor::temperature("controller inner temp upper", 0x9019);
const INNER_TEMP_RECOVER: RegisterDescriptor =
    RegisterDescriptor::temperature("controller inner temp recover", 0x901A);
const POWER_TEMP_UPPER: RegisterDescriptor =
    RegisterDescriptor::temperature("power component temp upper", 0x901B);
const POWER_TEMP_RECOVER: RegisterDescriptor =
    RegisterDescriptor::temperature("power component temp recover", 0x901C);
const LINE_IMPEDANCE: RegisterDescriptor = RegisterDescriptor::fixed("line impedance", 0x901D);
const NIGHT_THRESHOLD_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("night time threshold voltage", 0x901E);
const LIGHT_ON_DELAY: RegisterDescriptor = RegisterDescriptor::int("light signal on delay", 0x901F);
const DAY_THRESHOLD_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("day time threshold voltage", 0x9020);
const LIGHT_OFF_DELAY: RegisterDescriptor =
    RegisterDescriptor::int("light signal off delay", 0x9021);

#[must_use]
pub const fn battery_type_label(code: u16) -> &'static str {
    match code {
        0x00 => "User Defined",
        0x01 => "Sealed",
        0x02 => "Gel",
        0x03 => "Flooded",
        _ => "Unknown",
    }
}

/// Controller clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControllerClock {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ControllerClock {
    /// Three words: minute:second, day:hour, year:month (high byte first).
    #[must_use]
    pub fn from_words(words: [u16; 3]) -> Self {
        let [ms, dh, ym] = words.map(u16::to_be_bytes);
        Self {
            year: 2000 + u16::from(ym[0]),
            month: ym[1],
            day: dh[0],
            hour: dh[1],
            minute: ms[0],
            second: ms[1],
        }
    }
}

impl std::fmt::Display for ControllerClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureLimits {
    pub battery_temp_warning_upper_limit: f64,
    pub battery_temp_warning_lower_limit: f64,
    pub controller_inner_temp_upper_limit: f64,
    pub controller_inner_temp_upper_limit_recover: f64,
    pub power_component_temp_upper_limit: f64,
    pub power_component_temp_upper_limit_recover: f64,
    pub line_impedence: f64,
    pub lighttime_threshold_voltage: f64,
    pub light_signal_startup_time: f64,
    pub daytime_threshold_voltage: f64,
    pub light_signal_close_delay_time: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTimers {
    pub load_controlling_mode: u16,
    pub working_time_length1: String,
    pub working_time_length2: String,
    pub turn_on_timing1: String,
    pub turn_off_timing1: String,
    pub turn_on_timing2: String,
    pub turn_off_timing2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NightAndDurations {
    pub length_of_night: String,
    pub battery_rated_voltage_code: u16,
    pub load_timing_control_selection: u16,
    pub default_load_on_off_manual_mode: u16,
    pub equalize_duration: u16,
    pub boost_duration: u16,
    pub discharging_percentage: u16,
    pub charging_percentage: u16,
    pub battery_management_mode: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub battery_type: &'static str,
    pub battery_capacity: u16,
    pub temp_compensation_coeff: f64,
    pub high_voltage_disconnect: f64,
    pub charging_limit_voltage: f64,
    pub over_voltage_reconnect: f64,
    pub equalization_voltage: f64,
    pub boost_voltage: f64,
    pub float_voltage: f64,
    pub boost_reconnect_voltage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_voltage_reconnect: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under_voltage_recover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under_voltage_warning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_voltage_disconnect: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discharging_limit_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_clock: Option<ControllerClock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_limits: Option<TemperatureLimits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_timers: Option<LoadTimers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub night_and_durations: Option<NightAndDurations>,
}

pub fn read_settings(
    t: &mut dyn DeviceTransport,
    protocol: ProtocolVersion,
    unit: TemperatureUnit,
) -> Result<Settings, TransportError> {
    let b = Block::holding(t, reg::BATTERY_TYPE, protocol.settings_words(), unit)?;
    let mut settings = Settings {
        battery_type: battery_type_label(b.word(reg::BATTERY_TYPE)?),
        battery_capacity: b.word(reg::BATTERY_CAPACITY)?,
        temp_compensation_coeff: b.value(&TEMP_COMPENSATION)?,
        high_voltage_disconnect: b.value(&HIGH_VOLTAGE_DISCONNECT)?,
        charging_limit_voltage: b.value(&CHARGING_LIMIT_VOLTAGE)?,
        over_voltage_reconnect: b.value(&OVER_VOLTAGE_RECONNECT)?,
        equalization_voltage: b.value(&EQUALIZATION_VOLTAGE)?,
        boost_voltage: b.value(&BOOST_VOLTAGE)?,
        float_voltage: b.value(&FLOAT_VOLTAGE)?,
        boost_reconnect_voltage: b.value(&BOOST_RECONNECT_VOLTAGE)?,
        low_voltage_reconnect: None,
        under_voltage_recover: None,
        under_voltage_warning: None,
        low_voltage_disconnect: None,
        discharging_limit_voltage: None,
        controller_clock: None,
        temperature_limits: None,
        load_timers: None,
        night_and_durations: None,
    };
    if protocol == ProtocolVersion::Legacy {
        return Ok(settings);
    }

    settings.low_voltage_reconnect = Some(b.value(&LOW_VOLTAGE_RECONNECT)?);
    settings.under_voltage_recover = Some(b.value(&UNDER_VOLTAGE_RECOVER)?);
    settings.under_voltage_warning = Some(b.value(&UNDER_VOLTAGE_WARNING)?);
    settings.low_voltage_disconnect = Some(b.value(&LOW_VOLTAGE_DISCONNECT)?);
    settings.discharging_limit_voltage = Some(b.value(&DISCHARGING_LIMIT_VOLTAGE)?);

    let clk = Block::holding(t, reg::REALTIME_CLOCK, reg::REALTIME_CLOCK_WORDS, unit)?;
    settings.controller_clock = Some(ControllerClock::from_words([
        clk.word(reg::REALTIME_CLOCK)?,
        clk.word(reg::REALTIME_CLOCK + 1)?,
        clk.word(reg::REALTIME_CLOCK + 2)?,
    ]));

    let lim = Block::holding(t, reg::TEMPERATURE_LIMITS, reg::TEMPERATURE_LIMITS_WORDS, unit)?;
    settings.temperature_limits = Some(TemperatureLimits {
        battery_temp_warning_upper_limit: lim.value(&BATTERY_TEMP_UPPER)?,
        battery_temp_warning_lower_limit: lim.value(&BATTERY_TEMP_LOWER)?,
        controller_inner_temp_upper_limit: lim.value(&INNER_TEMP_UPPER)?,
        controller_inner_temp_upper_limit_recover: lim.value(&INNER_TEMP_RECOVER)?,
        power_component_temp_upper_limit: lim.value(&POWER_TEMP_UPPER)?,
        power_component_temp_upper_limit_recover: lim.value(&POWER_TEMP_RECOVER)?,
        line_impedence: lim.value(&LINE_IMPEDANCE)?,
        lighttime_threshold_voltage: lim.value(&NIGHT_THRESHOLD_VOLTAGE)?,
        light_signal_startup_time: lim.value(&LIGHT_ON_DELAY)?,
        daytime_threshold_voltage: lim.value(&DAY_THRESHOLD_VOLTAGE)?,
        light_signal_close_delay_time: lim.value(&LIGHT_OFF_DELAY)?,
    });

    let ld = Block::holding(
        t,
        reg::LOAD_CONTROLLING_MODE,
        reg::LOAD_TIMER_BLOCK_WORDS,
        unit,
    )?;
    settings.load_timers = Some(LoadTimers {
        load_controlling_mode: ld.word(reg::LOAD_CONTROLLING_MODE)?,
        working_time_length1: ld.hour_minute(reg::WORKING_TIME_LENGTH_1)?,
        working_time_length2: ld.hour_minute(reg::WORKING_TIME_LENGTH_2)?,
        turn_on_timing1: ld.timing(reg::TURN_ON_TIMING_1)?,
        turn_off_timing1: ld.timing(reg::TURN_OFF_TIMING_1)?,
        turn_on_timing2: ld.timing(reg::TURN_ON_TIMING_2)?,
        turn_off_timing2: ld.timing(reg::TURN_OFF_TIMING_2)?,
    });

    let nd = Block::holding(
        t,
        reg::LENGTH_OF_NIGHT,
        reg::NIGHT_AND_DURATION_BLOCK_WORDS,
        unit,
    )?;
    settings.night_and_durations = Some(NightAndDurations {
        length_of_night: nd.hour_minute(reg::LENGTH_OF_NIGHT)?,
        battery_rated_voltage_code: nd.word(reg::BATTERY_RATED_VOLTAGE_CODE)?,
        load_timing_control_selection: nd.word(reg::LOAD_TIMING_CONTROL_SELECTION)?,
        default_load_on_off_manual_mode: nd.word(reg::DEFAULT_LOAD_MANUAL_MODE)?,
        equalize_duration: nd.word(reg::EQUALIZE_DURATION)?,
        boost_duration: nd.word(reg::BOOST_DURATION)?,
        discharging_percentage: nd.word(reg::DISCHARGING_PERCENTAGE)?,
        charging_percentage: nd.word(reg::CHARGING_PERCENTAGE)?,
        battery_management_mode: nd.word(reg::BATTERY_MANAGEMENT_MODE)?,
    });
    Ok(settings)
}

// ---------------------------------------------------------------------------
// statistics (input 0x3300)

const MAX_INPUT_VOLTAGE_TODAY: RegisterDescriptor =
    RegisterDescriptor::fixed("max input voltage today", 0x3300);
const MIN_INPUT_VOLTAGE_TODAY: RegisterDescriptor =
    RegisterDescriptor::fixed("min input voltage today", 0x3301);
const MAX_BATTERY_VOLTAGE_TODAY: RegisterDescriptor =
    RegisterDescriptor::fixed("max battery voltage today", 0x3302);
const MIN_BATTERY_VOLTAGE_TODAY: RegisterDescriptor =
    RegisterDescriptor::fixed("min battery voltage today", 0x3303);
const CONSUMED_TODAY: RegisterDescriptor = RegisterDescriptor::wide("consumed today", 0x3304);
const CONSUMED_MONTH: RegisterDescriptor = RegisterDescriptor::wide("consumed month", 0x3306);
const CONSUMED_YEAR: RegisterDescriptor = RegisterDescriptor::wide("consumed year", 0x3308);
const CONSUMED_TOTAL: RegisterDescriptor = RegisterDescriptor::wide("consumed total", 0x330A);
const GENERATED_TODAY: RegisterDescriptor = RegisterDescriptor::wide("generated today", 0x330C);
const GENERATED_MONTH: RegisterDescriptor = RegisterDescriptor::wide("generated month", 0x330E);
const GENERATED_YEAR: RegisterDescriptor = RegisterDescriptor::wide("generated year", 0x3310);
const GENERATED_TOTAL: RegisterDescriptor = RegisterDescriptor::wide("generated total", 0x3312);
const CO2_REDUCTION: RegisterDescriptor = RegisterDescriptor::wide("co2 reduction", 0x3314);
const STAT_BATTERY_VOLTAGE: RegisterDescriptor =
    RegisterDescriptor::fixed("net battery voltage", 0x331A);
const STAT_BATTERY_CURRENT: RegisterDescriptor =
    RegisterDescriptor::signed_wide("net battery current", 0x331B);
const STAT_BATTERY_TEMP: RegisterDescriptor =
    RegisterDescriptor::temperature("battery temp", 0x331D);
const AMBIENT_TEMP: RegisterDescriptor = RegisterDescriptor::temperature("ambient temp", 0x331E);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalParameters {
    pub maximum_input_voltage_today: f64,
    pub minimum_input_voltage_today: f64,
    pub maximum_battery_voltage_today: f64,
    pub minimum_battery_voltage_today: f64,
    pub consumed_energy_today: f64,
    pub consumed_energy_month: f64,
    pub consumed_energy_year: f64,
    pub total_consumed_energy: f64,
    pub generated_energy_today: f64,
    pub generated_energy_month: f64,
    pub generated_energy_year: f64,
    pub total_generated_energy: f64,
    #[serde(rename = "CO2Reduction")]
    pub co2_reduction: f64,
    pub battery_voltage: f64,
    /// Positive while charging.
    pub battery_current: f64,
    pub battery_temp: f64,
    pub ambient_temp: f64,
}

pub fn read_statistics(
    t: &mut dyn DeviceTransport,
    unit: TemperatureUnit,
) -> Result<StatisticalParameters, TransportError> {
    let b = Block::input(t, reg::STATISTICS, reg::STATISTICS_WORDS, unit)?;
    Ok(StatisticalParameters {
        maximum_input_voltage_today: b.value(&MAX_INPUT_VOLTAGE_TODAY)?,
        minimum_input_voltage_today: b.value(&MIN_INPUT_VOLTAGE_TODAY)?,
        maximum_battery_voltage_today: b.value(&MAX_BATTERY_VOLTAGE_TODAY)?,
        minimum_battery_voltage_today: b.value(&MIN_BATTERY_VOLTAGE_TODAY)?,
        consumed_energy_today: b.value(&CONSUMED_TODAY)?,
        consumed_energy_month: b.value(&CONSUMED_MONTH)?,
        consumed_energy_year: b.value(&CONSUMED_YEAR)?,
        total_consumed_energy: b.value(&CONSUMED_TOTAL)?,
        generated_energy_today: b.value(&GENERATED_TODAY)?,
        generated_energy_month: b.value(&GENERATED_MONTH)?,
        generated_energy_year: b.value(&GENERATED_YEAR)?,
        total_generated_energy: b.value(&GENERATED_TOTAL)?,
        co2_reduction: b.value(&CO2_REDUCTION)?,
        battery_voltage: b.value(&STAT_BATTERY_VOLTAGE)?,
        battery_current: b.value(&STAT_BATTERY_CURRENT)?,
        battery_temp: b.value(&STAT_BATTERY_TEMP)?,
        ambient_temp: b.value(&AMBIENT_TEMP)?,
    })
}

// ---------------------------------------------------------------------------
// snapshot

/// Which blocks a poll cycle reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSelection {
    pub realtime: bool,
    pub other: bool,
}

impl BlockSelection {
    pub const ALL: Self = Self {
        realtime: true,
        other: true,
    };
    pub const REALTIME_ONLY: Self = Self {
        realtime: true,
        other: false,
    };
}

/// One poll cycle's worth of telemetry. A block that failed to read is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub topic: String,
    pub controller_id: String,
    pub protocol: &'static str,
    /// Unix seconds at the start of the cycle.
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rated_data: Option<RatedData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_data: Option<RealTimeData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_status: Option<RealTimeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticalParameters>,
}

impl TelemetrySnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rated_data.is_none()
            && self.realtime_data.is_none()
            && self.realtime_status.is_none()
            && self.settings.is_none()
            && self.statistics.is_none()
    }
}

fn logged<T>(what: &str, res: Result<T, TransportError>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("{what} read failed: {e}");
            None
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Read the selected blocks. Each block is independent; one failing does not
/// stop the others.
pub fn read_snapshot(
    t: &mut dyn DeviceTransport,
    config: &BridgeConfig,
    which: BlockSelection,
) -> TelemetrySnapshot {
    let protocol = config.protocol;
    let unit = config.temperature_unit;
    let mut snap = TelemetrySnapshot {
        topic: config.publish_topic(),
        controller_id: config.controller_id.clone(),
        protocol: protocol.as_str(),
        timestamp: unix_now(),
        rated_data: None,
        realtime_data: None,
        realtime_status: None,
        settings: None,
        statistics: None,
    };
    if which.realtime {
        snap.realtime_data = logged("real-time data", read_realtime_data(t, protocol, unit));
        snap.realtime_status = logged("real-time status", read_realtime_status(t));
    }
    if which.other {
        snap.rated_data = logged("rated data", read_rated_data(t, protocol));
        snap.settings = logged("settings", read_settings(t, protocol, unit));
        snap.statistics = logged("statistics", read_statistics(t, unit));
    }
    snap
}
