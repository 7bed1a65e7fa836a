//! Register and coil addresses of the LandStar LS1024B (EPSolar LS-B protocol).
//!
//! Input registers (read-only, function 0x04) live in the 0x3000 blocks,
//! holding registers (read/write, functions 0x03/0x10) in the 0x9000 block.
//! Two-word quantities are stored low word first.

pub type Address = u16;

/// Modbus slave id the controller answers on.
pub const LANDSTAR_1024B_ID: u8 = 0x01;

// rated data (input)
pub const RATED_DATA: Address = 0x3000;
pub const RATED_DATA_WORDS: u16 = 0x09;
pub const RATED_LOAD_CURRENT: Address = 0x300E;

// real-time data (input)
pub const REALTIME_DATA: Address = 0x3100;
pub const BATTERY_SOC: Address = 0x311A;
pub const REMOTE_BATTERY_TEMPERATURE: Address = 0x311B;
pub const BATTERY_REAL_RATED_POWER: Address = 0x311D;

// real-time status (input)
pub const REALTIME_STATUS: Address = 0x3200;
pub const REALTIME_STATUS_WORDS: u16 = 0x03;

// statistical parameters (input)
pub const STATISTICS: Address = 0x3300;
pub const STATISTICS_WORDS: u16 = 0x1F;

// settings (holding)
pub const BATTERY_TYPE: Address = 0x9000;
pub const BATTERY_CAPACITY: Address = 0x9001;
pub const TEMP_COMPENSATION_COEFFICIENT: Address = 0x9002;
pub const HIGH_VOLTAGE_DISCONNECT: Address = 0x9003;
pub const CHARGING_LIMIT_VOLTAGE: Address = 0x9004;
pub const OVER_VOLTAGE_RECONNECT: Address = 0x9005;
pub const EQUALIZATION_VOLTAGE: Address = 0x9006;
pub const BOOST_VOLTAGE: Address = 0x9007;
pub const FLOAT_VOLTAGE: Address = 0x9008;
pub const BOOST_RECONNECT_VOLTAGE: Address = 0x9009;
pub const LOW_VOLTAGE_RECONNECT: Address = 0x900A;
pub const UNDER_VOLTAGE_RECOVER: Address = 0x900B;
pub const UNDER_VOLTAGE_WARNING: Address = 0x900C;
pub const LOW_VOLTAGE_DISCONNECT: Address = 0x900D;
pub const DISCHARGING_LIMIT_VOLTAGE: Address = 0x900E;

pub const REALTIME_CLOCK: Address = 0x9013;
pub const REALTIME_CLOCK_WORDS: u16 = 3;

pub const TEMPERATURE_LIMITS: Address = 0x9017;
pub const TEMPERATURE_LIMITS_WORDS: u16 = 0x0B;

pub const LOAD_CONTROLLING_MODE: Address = 0x903D;
pub const WORKING_TIME_LENGTH_1: Address = 0x903E;
pub const WORKING_TIME_LENGTH_2: Address = 0x903F;
pub const TURN_ON_TIMING_1: Address = 0x9042;
pub const TURN_OFF_TIMING_1: Address = 0x9045;
pub const TURN_ON_TIMING_2: Address = 0x9048;
pub const TURN_OFF_TIMING_2: Address = 0x904B;
/// 0x903D..=0x904D
pub const LOAD_TIMER_BLOCK_WORDS: u16 = 0x11;

pub const LENGTH_OF_NIGHT: Address = 0x9065;
pub const BATTERY_RATED_VOLTAGE_CODE: Address = 0x9067;
pub const LOAD_TIMING_CONTROL_SELECTION: Address = 0x9069;
pub const DEFAULT_LOAD_MANUAL_MODE: Address = 0x906A;
pub const EQUALIZE_DURATION: Address = 0x906B;
pub const BOOST_DURATION: Address = 0x906C;
pub const DISCHARGING_PERCENTAGE: Address = 0x906D;
pub const CHARGING_PERCENTAGE: Address = 0x906E;
pub const BATTERY_MANAGEMENT_MODE: Address = 0x9070;
/// 0x9065..=0x9070
pub const NIGHT_AND_DURATION_BLOCK_WORDS: u16 = 0x0C;

// coils
pub const COIL_CHARGING_DEVICE: Address = 0x0000;
pub const COIL_OUTPUT_CONTROL_MODE: Address = 0x0001;
pub const COIL_MANUAL_LOAD: Address = 0x0002;
pub const COIL_DEFAULT_LOAD: Address = 0x0003;
pub const COIL_LOAD_TEST_MODE: Address = 0x0005;
pub const COIL_FORCE_LOAD: Address = 0x0006;
pub const COIL_RESTORE_DEFAULTS: Address = 0x0013;
pub const COIL_CLEAR_STATISTICS: Address = 0x0014;
