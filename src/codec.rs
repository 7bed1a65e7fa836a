//! Register codec: raw 16-bit register words <-> engineering units.
//!
//! The controller stores analog quantities as fixed-point values scaled by
//! 100 (12.34 V is the word 1234). Quantities wider than 16 bits (power and
//! energy totals) span two adjacent registers, low word first. Temperatures
//! are signed fixed-point Celsius.
//!
//! Everything here is a pure function; nothing holds state.

use crate::config::TemperatureUnit;
use crate::error::{RangeError, TransportError};
use crate::registers::Address;

const SCALE: f64 = 100.0;
const ROUND_TRIP_TOLERANCE: f64 = 0.01 + 1e-9;

#[must_use]
pub fn decode_fixed_point(word: u16) -> f64 {
    f64::from(word) / SCALE
}

/// Same as [`decode_fixed_point`] but the word is two's-complement signed.
#[must_use]
pub fn decode_signed_fixed_point(word: u16) -> f64 {
    f64::from(i16::from_le_bytes(word.to_le_bytes())) / SCALE
}

/// Assemble a 32-bit quantity from `lo` (first register) and `hi` (second
/// register) and scale it. Swapping the two words is off by a factor of 65536.
#[must_use]
pub fn decode_fixed_point_wide(lo: u16, hi: u16, signed: bool) -> f64 {
    let raw = (u32::from(hi) << 16) | u32::from(lo);
    if signed {
        f64::from(i32::from_le_bytes(raw.to_le_bytes())) / SCALE
    } else {
        f64::from(raw) / SCALE
    }
}

#[must_use]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Decode a Celsius-native temperature register. The caller decides whether
/// the register needs converting; it is not inferred from the address.
#[must_use]
pub fn decode_temperature(word: u16, to_fahrenheit: bool) -> f64 {
    let c = decode_signed_fixed_point(word);
    if to_fahrenheit {
        celsius_to_fahrenheit(c)
    } else {
        c
    }
}

/// Inverse of [`decode_fixed_point`]: `round(value * 100)`.
///
/// Rejects non-finite values, values that do not fit a register and values
/// whose encoded form does not decode back to within 0.01 of the input.
pub fn encode_fixed_point(field: &'static str, value: f64) -> Result<u16, RangeError> {
    let max = f64::from(u16::MAX) / SCALE;
    let out_of_range = RangeError {
        field,
        value,
        min: 0.0,
        max,
    };
    if !value.is_finite() {
        return Err(out_of_range);
    }
    let scaled = (value * SCALE).round();
    if scaled < 0.0 || scaled > f64::from(u16::MAX) {
        return Err(out_of_range);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let word = scaled as u16;
    if (decode_fixed_point(word) - value).abs() > ROUND_TRIP_TOLERANCE {
        return Err(out_of_range);
    }
    Ok(word)
}

/// Direct cast of an integer setting after checking it against `bounds`.
pub fn encode_int(value: i64, bounds: &Bounds) -> Result<u16, RangeError> {
    bounds.check_int(value)?;
    u16::try_from(value).map_err(|_| RangeError {
        field: bounds.field,
        value: value as f64,
        min: 0.0,
        max: f64::from(u16::MAX),
    })
}

/// Documented valid range of one writable field, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(field: &'static str, min: f64, max: f64) -> Self {
        Self { field, min, max }
    }

    fn error(&self, value: f64) -> RangeError {
        RangeError {
            field: self.field,
            value,
            min: self.min,
            max: self.max,
        }
    }

    pub fn check(&self, value: f64) -> Result<f64, RangeError> {
        if value.is_finite() && value >= self.min && value <= self.max {
            Ok(value)
        } else {
            Err(self.error(value))
        }
    }

    pub fn check_int(&self, value: i64) -> Result<i64, RangeError> {
        #[allow(clippy::cast_precision_loss)]
        let v = value as f64;
        self.check(v).map(|_| value)
    }

    /// Range-check then fixed-point encode.
    pub fn encode_fixed_point(&self, value: f64) -> Result<u16, RangeError> {
        self.check(value)?;
        encode_fixed_point(self.field, value)
    }
}

/// `hour << 8 | minute`, the packing used by working-time lengths and the
/// length-of-night register.
#[must_use]
pub fn pack_hour_minute(hour: u8, minute: u8) -> u16 {
    (u16::from(hour) << 8) | u16::from(minute)
}

#[must_use]
pub fn unpack_hour_minute(word: u16) -> (u8, u8) {
    let [minute, hour] = word.to_le_bytes();
    (hour, minute)
}

/// Number of registers a quantity occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Single,
    Double,
}

impl Width {
    #[must_use]
    pub const fn words(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Raw signed 16-bit integer (codes, counts, percentages).
    Int16,
    /// Unsigned value ×100.
    FixedPoint,
    /// Two's-complement value ×100.
    SignedFixedPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    None,
    /// Celsius-native register, converted when the configured unit asks for it.
    Temperature,
}

/// How one logical quantity is laid out in the register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub address: Address,
    pub width: Width,
    pub kind: NumericKind,
    pub transform: Transform,
}

impl RegisterDescriptor {
    #[must_use]
    pub const fn fixed(name: &'static str, address: Address) -> Self {
        Self {
            name,
            address,
            width: Width::Single,
            kind: NumericKind::FixedPoint,
            transform: Transform::None,
        }
    }

    #[must_use]
    pub const fn wide(name: &'static str, address: Address) -> Self {
        Self {
            name,
            address,
            width: Width::Double,
            kind: NumericKind::FixedPoint,
            transform: Transform::None,
        }
    }

    #[must_use]
    pub const fn signed_wide(name: &'static str, address: Address) -> Self {
        Self {
            name,
            address,
            width: Width::Double,
            kind: NumericKind::SignedFixedPoint,
            transform: Transform::None,
        }
    }

    #[must_use]
    pub const fn int(name: &'static str, address: Address) -> Self {
        Self {
            name,
            address,
            width: Width::Single,
            kind: NumericKind::Int16,
            transform: Transform::None,
        }
    }

    #[must_use]
    pub const fn temperature(name: &'static str, address: Address) -> Self {
        Self {
            name,
            address,
            width: Width::Single,
            kind: NumericKind::SignedFixedPoint,
            transform: Transform::Temperature,
        }
    }

    /// Decode this quantity out of `block`, a run of words read starting at `base`.
    pub fn decode(
        &self,
        base: Address,
        block: &[u16],
        unit: TemperatureUnit,
    ) -> Result<f64, TransportError> {
        let offset = usize::from(self.address.checked_sub(base).ok_or_else(|| {
            TransportError::Protocol(format!(
                "{}: address 0x{:04X} precedes block start 0x{base:04X}",
                self.name, self.address
            ))
        })?);
        let words = block
            .get(offset..offset + self.width.words())
            .ok_or_else(|| {
                TransportError::Protocol(format!(
                    "{}: block of {} words does not cover 0x{:04X}",
                    self.name,
                    block.len(),
                    self.address
                ))
            })?;
        let value = match (self.width, self.kind) {
            (Width::Single, NumericKind::Int16) => {
                f64::from(i16::from_le_bytes(words[0].to_le_bytes()))
            }
            (Width::Single, NumericKind::FixedPoint) => decode_fixed_point(words[0]),
            (Width::Single, NumericKind::SignedFixedPoint) => decode_signed_fixed_point(words[0]),
            (Width::Double, NumericKind::Int16) => {
                f64::from((u32::from(words[1]) << 16) | u32::from(words[0]))
            }
            (Width::Double, NumericKind::FixedPoint) => {
                decode_fixed_point_wide(words[0], words[1], false)
            }
            (Width::Double, NumericKind::SignedFixedPoint) => {
                decode_fixed_point_wide(words[0], words[1], true)
            }
        };
        Ok(match self.transform {
            Transform::Temperature if unit.is_fahrenheit() => celsius_to_fahrenheit(value),
            _ => value,
        })
    }
}

/// Round to `places` decimals for presentation.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (value * f).round() / f
}
