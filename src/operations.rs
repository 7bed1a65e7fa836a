//! Device operations behind the command table.
//!
//! Each operation validates its input against the documented range of the
//! destination register before touching the line. An out-of-range value
//! returns `DispatchError::Range` and nothing is written.

use crate::codec::{encode_int, pack_hour_minute, Bounds};
use crate::commands::{HourMinute, HourMinuteSecond, TimeField};
use crate::error::{DispatchError, TransportError};
use crate::registers::{self as reg, Address};
use crate::transport::DeviceTransport;

pub type Transport<'a> = &'a mut dyn DeviceTransport;

/// Battery voltage setpoints of a 12 V system.
pub const VOLTAGE_MIN: f64 = 9.0;
pub const VOLTAGE_MAX: f64 = 17.0;

const HOUR: Bounds = Bounds {
    field: "hour",
    min: 0.0,
    max: 23.0,
};
const MINUTE: Bounds = Bounds {
    field: "minute",
    min: 0.0,
    max: 59.0,
};
const SECOND: Bounds = Bounds {
    field: "second",
    min: 0.0,
    max: 59.0,
};

fn voltage(field: &'static str) -> Bounds {
    Bounds::new(field, VOLTAGE_MIN, VOLTAGE_MAX)
}

fn write_float_setting(
    t: Transport<'_>,
    addr: Address,
    bounds: &Bounds,
    value: f64,
) -> Result<(), DispatchError> {
    let word = bounds.encode_fixed_point(value)?;
    log::debug!("{} -> 0x{addr:04X} = {word} ({value:.2})", bounds.field);
    t.write_register(addr, word)?;
    Ok(())
}

fn write_int_setting(
    t: Transport<'_>,
    addr: Address,
    bounds: &Bounds,
    value: i64,
) -> Result<(), DispatchError> {
    let word = encode_int(value, bounds)?;
    log::debug!("{} -> 0x{addr:04X} = {word}", bounds.field);
    t.write_register(addr, word)?;
    Ok(())
}

fn write_coil_setting(
    t: Transport<'_>,
    addr: Address,
    field: &'static str,
    value: i64,
) -> Result<(), DispatchError> {
    let v = Bounds::new(field, 0.0, 1.0).check_int(value)?;
    set_coil(t, addr, field, v == 1)
}

fn set_coil(
    t: Transport<'_>,
    addr: Address,
    field: &'static str,
    value: bool,
) -> Result<(), DispatchError> {
    log::debug!("{field} -> coil 0x{addr:04X} = {value}");
    t.write_coil(addr, value)?;
    Ok(())
}

fn hour_minute_word(hm: HourMinute) -> Result<u16, DispatchError> {
    HOUR.check(f64::from(hm.hour))?;
    MINUTE.check(f64::from(hm.minute))?;
    Ok(pack_hour_minute(hm.hour, hm.minute))
}

fn write_hour_minute(
    t: Transport<'_>,
    addr: Address,
    field: &'static str,
    hm: HourMinute,
) -> Result<(), DispatchError> {
    let word = hour_minute_word(hm)?;
    log::debug!(
        "{field} -> 0x{addr:04X} = 0x{word:04X} ({:02}:{:02})",
        hm.hour,
        hm.minute
    );
    t.write_register(addr, word)?;
    Ok(())
}

/// Seconds, minutes and hours live in three consecutive registers starting
/// at `base`. They are written one at a time in that order; a failed
/// sub-write does not stop the later ones and nothing is rolled back.
fn write_timing(
    t: Transport<'_>,
    base: Address,
    field: &'static str,
    hms: HourMinuteSecond,
) -> Result<(), DispatchError> {
    HOUR.check(f64::from(hms.hour))?;
    MINUTE.check(f64::from(hms.minute))?;
    SECOND.check(f64::from(hms.second))?;

    let mut applied: Vec<TimeField> = Vec::with_capacity(3);
    let mut first_failure: Option<(TimeField, TransportError)> = None;
    for (offset, tf) in (0u16..).zip(TimeField::WRITE_ORDER) {
        let addr = base + offset;
        let value = hms.field(tf);
        match t.write_register(addr, u16::from(value)) {
            Ok(()) => {
                log::debug!("{field} {tf} -> 0x{addr:04X} = {value}");
                applied.push(tf);
            }
            Err(e) => {
                log::warn!("{field} {tf} -> 0x{addr:04X} failed: {e}");
                if first_failure.is_none() {
                    first_failure = Some((tf, e));
                }
            }
        }
    }

    match first_failure {
        None => Ok(()),
        Some((_, e)) if applied.is_empty() => Err(DispatchError::Transport(e)),
        Some((failed, source)) => Err(DispatchError::PartialWrite {
            failed,
            applied,
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// battery

/// 0 user defined, 1 sealed, 2 gel, 3 flooded
pub fn set_battery_type(t: Transport<'_>, code: i64) -> Result<(), DispatchError> {
    write_int_setting(t, reg::BATTERY_TYPE, &Bounds::new("battery type", 0.0, 3.0), code)
}

pub fn set_battery_capacity(t: Transport<'_>, amp_hours: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::BATTERY_CAPACITY,
        &Bounds::new("battery capacity", 1.0, 9999.0),
        amp_hours,
    )
}

/// mV/°C/2V
pub fn set_temperature_compensation_coefficient(
    t: Transport<'_>,
    value: f64,
) -> Result<(), DispatchError> {
    write_float_setting(
        t,
        reg::TEMP_COMPENSATION_COEFFICIENT,
        &Bounds::new("temperature compensation coefficient", 0.0, 9.0),
        value,
    )
}

pub fn set_battery_management_mode(t: Transport<'_>, mode: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::BATTERY_MANAGEMENT_MODE,
        &Bounds::new("battery management mode", 0.0, 1.0),
        mode,
    )
}

// ---------------------------------------------------------------------------
// voltage setpoints

pub fn set_high_voltage_disconnect(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::HIGH_VOLTAGE_DISCONNECT, &voltage("high voltage disconnect"), v)
}

pub fn set_charging_limit_voltage(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::CHARGING_LIMIT_VOLTAGE, &voltage("charging limit voltage"), v)
}

pub fn set_over_voltage_reconnect(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::OVER_VOLTAGE_RECONNECT, &voltage("over voltage reconnect"), v)
}

pub fn set_equalization_voltage(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::EQUALIZATION_VOLTAGE, &voltage("equalization voltage"), v)
}

pub fn set_boost_voltage(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::BOOST_VOLTAGE, &voltage("boost voltage"), v)
}

pub fn set_float_voltage(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::FLOAT_VOLTAGE, &voltage("float voltage"), v)
}

pub fn set_boost_reconnect_voltage(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::BOOST_RECONNECT_VOLTAGE, &voltage("boost reconnect voltage"), v)
}

pub fn set_low_voltage_reconnect(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::LOW_VOLTAGE_RECONNECT, &voltage("low voltage reconnect"), v)
}

pub fn set_under_voltage_recover(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::UNDER_VOLTAGE_RECOVER, &voltage("under voltage recover"), v)
}

pub fn set_under_voltage_warning(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::UNDER_VOLTAGE_WARNING, &voltage("under voltage warning"), v)
}

pub fn set_low_voltage_disconnect(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(t, reg::LOW_VOLTAGE_DISCONNECT, &voltage("low voltage disconnect"), v)
}

pub fn set_discharging_limit_voltage(t: Transport<'_>, v: f64) -> Result<(), DispatchError> {
    write_float_setting(
        t,
        reg::DISCHARGING_LIMIT_VOLTAGE,
        &voltage("discharging limit voltage"),
        v,
    )
}

// ---------------------------------------------------------------------------
// durations and percentages

pub fn set_equalize_duration(t: Transport<'_>, minutes: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::EQUALIZE_DURATION,
        &Bounds::new("equalize duration", 0.0, 180.0),
        minutes,
    )
}

pub fn set_boost_duration(t: Transport<'_>, minutes: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::BOOST_DURATION,
        &Bounds::new("boost duration", 10.0, 180.0),
        minutes,
    )
}

pub fn set_discharging_percentage(t: Transport<'_>, pct: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::DISCHARGING_PERCENTAGE,
        &Bounds::new("discharging percentage", 20.0, 100.0),
        pct,
    )
}

pub fn set_charging_percentage(t: Transport<'_>, pct: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::CHARGING_PERCENTAGE,
        &Bounds::new("charging percentage", 0.0, 100.0),
        pct,
    )
}

// ---------------------------------------------------------------------------
// load timers

/// 0 manual, 1 light on/off, 2 light on + timer, 3 time control
pub fn set_load_controlling_mode(t: Transport<'_>, mode: i64) -> Result<(), DispatchError> {
    write_int_setting(
        t,
        reg::LOAD_CONTROLLING_MODE,
        &Bounds::new("load controlling mode", 0.0, 3.0),
        mode,
    )
}

pub fn set_working_time_length_1(t: Transport<'_>, hm: HourMinute) -> Result<(), DispatchError> {
    write_hour_minute(t, reg::WORKING_TIME_LENGTH_1, "working time length 1", hm)
}

pub fn set_working_time_length_2(t: Transport<'_>, hm: HourMinute) -> Result<(), DispatchError> {
    write_hour_minute(t, reg::WORKING_TIME_LENGTH_2, "working time length 2", hm)
}

pub fn set_length_of_night(t: Transport<'_>, hm: HourMinute) -> Result<(), DispatchError> {
    write_hour_minute(t, reg::LENGTH_OF_NIGHT, "length of night", hm)
}

pub fn set_turn_on_timing_1(t: Transport<'_>, hms: HourMinuteSecond) -> Result<(), DispatchError> {
    write_timing(t, reg::TURN_ON_TIMING_1, "turn on timing 1", hms)
}

pub fn set_turn_off_timing_1(
    t: Transport<'_>,
    hms: HourMinuteSecond,
) -> Result<(), DispatchError> {
    write_timing(t, reg::TURN_OFF_TIMING_1, "turn off timing 1", hms)
}

pub fn set_turn_on_timing_2(t: Transport<'_>, hms: HourMinuteSecond) -> Result<(), DispatchError> {
    write_timing(t, reg::TURN_ON_TIMING_2, "turn on timing 2", hms)
}

pub fn set_turn_off_timing_2(
    t: Transport<'_>,
    hms: HourMinuteSecond,
) -> Result<(), DispatchError> {
    write_timing(t, reg::TURN_OFF_TIMING_2, "turn off timing 2", hms)
}

// ---------------------------------------------------------------------------
// coils

pub fn set_charging_device_on(t: Transport<'_>) -> Result<(), DispatchError> {
    set_coil(t, reg::COIL_CHARGING_DEVICE, "charging device", true)
}

pub fn set_charging_device_off(t: Transport<'_>) -> Result<(), DispatchError> {
    set_coil(t, reg::COIL_CHARGING_DEVICE, "charging device", false)
}

pub fn set_load_device_on(t: Transport<'_>) -> Result<(), DispatchError> {
    set_coil(t, reg::COIL_MANUAL_LOAD, "manual load", true)
}

pub fn set_load_device_off(t: Transport<'_>) -> Result<(), DispatchError> {
    set_coil(t, reg::COIL_MANUAL_LOAD, "manual load", false)
}

/// 0 manual, 1 automatic
pub fn set_output_control_mode(t: Transport<'_>, value: i64) -> Result<(), DispatchError> {
    write_coil_setting(t, reg::COIL_OUTPUT_CONTROL_MODE, "output control mode", value)
}

pub fn set_default_load_control(t: Transport<'_>, value: i64) -> Result<(), DispatchError> {
    write_coil_setting(t, reg::COIL_DEFAULT_LOAD, "default load control", value)
}

pub fn set_load_test_mode(t: Transport<'_>, value: i64) -> Result<(), DispatchError> {
    write_coil_setting(t, reg::COIL_LOAD_TEST_MODE, "load test mode", value)
}

pub fn force_load(t: Transport<'_>, value: i64) -> Result<(), DispatchError> {
    write_coil_setting(t, reg::COIL_FORCE_LOAD, "force load", value)
}

pub fn restore_system_defaults(t: Transport<'_>) -> Result<(), DispatchError> {
    set_coil(t, reg::COIL_RESTORE_DEFAULTS, "restore system defaults", true)
}

pub fn clear_energy_generating_statistics(t: Transport<'_>) -> Result<(), DispatchError> {
    set_coil(t, reg::COIL_CLEAR_STATISTICS, "clear energy statistics", true)
}
