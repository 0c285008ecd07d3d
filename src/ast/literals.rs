use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

static DATETIME_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?(Z|[+-]\d{2}:?\d{2})?",
    )
    .expect("datetime shape is a valid regex")
});

static NUMBER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?%?")
        .expect("number shape is a valid regex")
});

/// How a number literal was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberUnit {
    /// Plain integer or decimal
    None,
    /// Trailing `%`: a fraction of a column-specific baseline
    Percent,
    /// Scientific notation, already applied to the value
    Exponent,
}

/// A numeric literal such as `42`, `-1.5`, `2e6`, `10%` or `inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    pub unit: NumberUnit,
}

impl NumberLiteral {
    pub fn plain(value: f64) -> Self {
        NumberLiteral {
            value,
            unit: NumberUnit::None,
        }
    }

    /// Length of the number-shaped prefix of `input`, if any.
    ///
    /// `inf` and `-inf` are not covered; the lexer checks them as words.
    pub fn scan(input: &str) -> Option<usize> {
        NUMBER_SHAPE.find(input).map(|m| m.end())
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "inf" => return Some(NumberLiteral::plain(f64::INFINITY)),
            "-inf" => return Some(NumberLiteral::plain(f64::NEG_INFINITY)),
            _ => {}
        }

        let (digits, percent) = match text.strip_suffix('%') {
            Some(rest) => (rest, true),
            None => (text, false),
        };
        let value: f64 = digits.parse().ok()?;
        let unit = if percent {
            NumberUnit::Percent
        } else if digits.contains(['e', 'E']) {
            NumberUnit::Exponent
        } else {
            NumberUnit::None
        };
        Some(NumberLiteral { value, unit })
    }
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_infinite() {
            return f.write_str(if self.value > 0.0 { "inf" } else { "-inf" });
        }
        match self.unit {
            NumberUnit::Percent => write!(f, "{}%", self.value),
            NumberUnit::Exponent => write!(f, "{:e}", self.value),
            NumberUnit::None => write!(f, "{}", self.value),
        }
    }
}

/// A date or date-time literal, with an optional explicit UTC offset.
///
/// Literals without an offset are resolved against a zone supplied at
/// evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatetimeLiteral {
    pub datetime: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl DatetimeLiteral {
    /// Length of the datetime-shaped prefix of `input`, if any.
    pub fn scan(input: &str) -> Option<usize> {
        DATETIME_SHAPE.find(input).map(|m| m.end())
    }

    /// Parses a complete literal; `None` for malformed or impossible values.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = DATETIME_SHAPE.captures(text)?;
        if caps.get(0)?.end() != text.len() {
            return None;
        }

        let number = |i: usize| -> Option<u32> { caps.get(i).and_then(|m| m.as_str().parse().ok()) };

        let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, number(2)?, number(3)?)?;
        let nanos = match caps.get(7) {
            Some(frac) => {
                let digits = frac.as_str();
                let padded = format!("{:0<9}", digits);
                padded.parse::<u32>().ok()?
            }
            None => 0,
        };
        let time = NaiveTime::from_hms_nano_opt(
            number(4).unwrap_or(0),
            number(5).unwrap_or(0),
            number(6).unwrap_or(0),
            nanos,
        )?;

        let offset = match caps.get(8).map(|m| m.as_str()) {
            None => None,
            Some("Z") => Some(FixedOffset::east_opt(0)?),
            Some(zone) => Some(parse_offset(zone)?),
        };

        Some(DatetimeLiteral {
            datetime: date.and_time(time),
            offset,
        })
    }

    /// Resolves to an instant, using `zone` when the literal has no offset.
    pub fn resolve(&self, zone: FixedOffset) -> Option<DateTime<Utc>> {
        let offset = self.offset.unwrap_or(zone);
        offset
            .from_local_datetime(&self.datetime)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for DatetimeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.datetime.format("%Y-%m-%dT%H:%M:%S%.f"))?;
        if let Some(offset) = self.offset {
            write!(f, "{}", offset)?;
        }
        Ok(())
    }
}

/// Parses `+HH:MM`, `-HHMM` style offsets.
pub fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let (sign, rest) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses a byte count such as `512`, `1MB`, `2.5 GiB` or `10k`.
///
/// Units are 1024-based and case-insensitive.
pub fn parse_size(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let split = trimmed
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_digit() || *ch == '.'))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());
    let (number_part, unit_part) = trimmed.split_at(split);
    if number_part.is_empty() {
        return None;
    }

    let value: f64 = number_part.parse().ok()?;
    let multiplier = match unit_part.trim().to_ascii_lowercase().as_str() {
        "" | "b" | "byte" | "bytes" => 1u64,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024_u64.pow(2),
        "g" | "gb" | "gib" => 1024_u64.pow(3),
        "t" | "tb" | "tib" => 1024_u64.pow(4),
        "p" | "pb" | "pib" => 1024_u64.pow(5),
        _ => return None,
    };
    Some(value * multiplier as f64)
}

#[test]
fn test_number_units() {
    assert_eq!(NumberLiteral::parse("42").map(|n| n.unit), Some(NumberUnit::None));
    assert_eq!(NumberLiteral::parse("1e3").map(|n| n.value), Some(1000.0));
    assert_eq!(NumberLiteral::parse("1e3").map(|n| n.unit), Some(NumberUnit::Exponent));
    assert_eq!(NumberLiteral::parse("25%").map(|n| n.unit), Some(NumberUnit::Percent));
    assert_eq!(NumberLiteral::parse("-inf").map(|n| n.value), Some(f64::NEG_INFINITY));
}

#[test]
fn test_size_units() {
    assert_eq!(parse_size("1MB"), Some(1_048_576.0));
    assert_eq!(parse_size("2.5 KiB"), Some(2560.0));
    assert_eq!(parse_size("300"), Some(300.0));
    assert_eq!(parse_size("MB"), None);
    assert_eq!(parse_size("3 parsecs"), None);
}

#[test]
fn test_datetime_forms() {
    let date = DatetimeLiteral::parse("2024-02-29").unwrap();
    assert_eq!(date.offset, None);
    assert!(DatetimeLiteral::parse("2023-02-29").is_none());

    let stamped = DatetimeLiteral::parse("2024-03-01T10:30:15.5+02:00").unwrap();
    let utc = stamped.resolve(FixedOffset::east_opt(0).unwrap()).unwrap();
    assert_eq!(utc.to_rfc3339(), "2024-03-01T08:30:15.500+00:00");
}
