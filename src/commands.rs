use std::fmt;
use std::str::FromStr;

use crate::error::InboundError;

/// Longest mnemonic or text parameter accepted from the network, in bytes.
pub const MAX_PARAM_LEN: usize = 32;

/// Owned string of at most [`MAX_PARAM_LEN`] bytes. Longer input is rejected,
/// never truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamText(String);

impl ParamText {
    pub fn new(field: &'static str, s: impl Into<String>) -> Result<Self, InboundError> {
        let s = s.into();
        if s.len() > MAX_PARAM_LEN {
            return Err(InboundError::TooLong {
                field,
                len: s.len(),
                max: MAX_PARAM_LEN,
            });
        }
        Ok(Self(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParamText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inbound command. Which parameter is meaningful depends on the
/// argument shape of the table entry the mnemonic resolves to; the others are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub mnemonic: ParamText,
    pub int_param: i64,
    pub float_param: f64,
    pub text_param: ParamText,
}

impl Command {
    /// The mnemonic is trimmed and upper-cased, so `"cdon"` runs `CDON`.
    /// Matching on the raw text would silently drop lower-case commands.
    pub fn new(mnemonic: &str) -> Result<Self, InboundError> {
        Ok(Self {
            mnemonic: ParamText::new("command", mnemonic.trim().to_ascii_uppercase())?,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn with_int(mut self, v: i64) -> Self {
        self.int_param = v;
        self
    }

    #[must_use]
    pub fn with_float(mut self, v: f64) -> Self {
        self.float_param = v;
        self
    }

    pub fn with_text(mut self, s: &str) -> Result<Self, InboundError> {
        self.text_param = ParamText::new("cParam", s)?;
        Ok(self)
    }

    #[must_use]
    pub fn mnemonic(&self) -> &str {
        self.mnemonic.as_str()
    }
}

/// Declared parameter kind of a command table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentShape {
    None,
    Int,
    Float,
    HourMinute,
    HourMinuteSecond,
}

impl ArgumentShape {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Int => "int",
            Self::Float => "float",
            Self::HourMinute => "hh:mm",
            Self::HourMinuteSecond => "hh:mm:ss",
        }
    }

    /// Minimum text length for the time shapes.
    #[must_use]
    pub const fn min_text_len(&self) -> usize {
        match self {
            Self::HourMinute => 5,
            Self::HourMinuteSecond => 8,
            _ => 0,
        }
    }
}

impl FromStr for ArgumentShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "hh:mm" => Ok(Self::HourMinute),
            "hh:mm:ss" => Ok(Self::HourMinuteSecond),
            other => Err(format!("unknown argument shape: {other}")),
        }
    }
}

/// One register of a multi-register time write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeField {
    Second,
    Minute,
    Hour,
}

impl TimeField {
    /// Order sub-writes are issued in.
    pub const WRITE_ORDER: [Self; 3] = [Self::Second, Self::Minute, Self::Hour];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "seconds",
            Self::Minute => "minutes",
            Self::Hour => "hours",
        }
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourMinute {
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourMinuteSecond {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl HourMinuteSecond {
    #[must_use]
    pub const fn field(&self, f: TimeField) -> u8 {
        match f {
            TimeField::Second => self.second,
            TimeField::Minute => self.minute,
            TimeField::Hour => self.hour,
        }
    }
}

/// Two ASCII digits at `text[at..at + 2]`. Separators are not inspected;
/// fields sit at fixed offsets.
fn two_digits(text: &[u8], at: usize) -> Option<u8> {
    match text.get(at..at + 2)? {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => Some((a - b'0') * 10 + (b - b'0')),
        _ => None,
    }
}

/// `"HH:MM"` with fields at offsets 0-1 and 3-4. Numeric ranges are not
/// checked here; the receiving operation does that.
#[must_use]
pub fn parse_hour_minute(text: &str) -> Option<HourMinute> {
    let b = text.as_bytes();
    if b.len() < ArgumentShape::HourMinute.min_text_len() {
        return None;
    }
    Some(HourMinute {
        hour: two_digits(b, 0)?,
        minute: two_digits(b, 3)?,
    })
}

/// `"HH:MM:SS"` with fields at offsets 0-1, 3-4 and 6-7.
#[must_use]
pub fn parse_hour_minute_second(text: &str) -> Option<HourMinuteSecond> {
    let b = text.as_bytes();
    if b.len() < ArgumentShape::HourMinuteSecond.min_text_len() {
        return None;
    }
    Some(HourMinuteSecond {
        hour: two_digits(b, 0)?,
        minute: two_digits(b, 3)?,
        second: two_digits(b, 6)?,
    })
}
