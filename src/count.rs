//! Byte count parsing for the command line.
//!
//! Accepts plain integers, decimals, and SI (`k`, `M`, `G`, `T`, `P`, `E`)
//! or IEC (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`) prefixes, with an optional
//! trailing `B`. Infinity and negative values mean "no limit".

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How many bytes to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteCount {
    /// Emit until the sink closes.
    Unlimited,
    /// Emit exactly this many bytes.
    Exactly(u64),
}

impl ByteCount {
    /// Returns the byte limit, if any.
    pub fn limit(self) -> Option<u64> {
        match self {
            ByteCount::Unlimited => None,
            ByteCount::Exactly(n) => Some(n),
        }
    }
}

impl fmt::Display for ByteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteCount::Unlimited => write!(f, "+Inf"),
            ByteCount::Exactly(n) => write!(f, "{n}"),
        }
    }
}

/// Byte count parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountError {
    #[error("byte count is empty")]
    Empty,
    #[error("byte count is not a number")]
    NotANumber,
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("unknown prefix {0:?}")]
    UnknownPrefix(String),
    #[error("byte count {0:?} is too large")]
    Overflow(String),
}

/// Multiplier for a unit prefix.
fn prefix_multiplier(prefix: &str) -> Option<u64> {
    let m = match prefix {
        "" => 1,
        "k" | "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        "E" => 1_000_000_000_000_000_000,
        "Ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        "Ti" => 1 << 40,
        "Pi" => 1 << 50,
        "Ei" => 1 << 60,
        _ => return None,
    };
    Some(m)
}

impl FromStr for ByteCount {
    type Err = CountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CountError::Empty);
        }

        let unsigned = s.trim_start_matches(['+', '-']);
        match unsigned.to_ascii_lowercase().as_str() {
            "inf" | "infinity" => return Ok(ByteCount::Unlimited),
            "nan" => return Err(CountError::NotANumber),
            _ => {}
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-')))
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);
        let prefix = unit.strip_suffix('B').unwrap_or(unit);
        let multiplier =
            prefix_multiplier(prefix).ok_or_else(|| CountError::UnknownPrefix(unit.to_string()))?;

        // Truncated toward zero before the sign check: "-0" and "-0.5" are zero bytes
        if number.contains('.') {
            let value: f64 = number
                .parse()
                .map_err(|_| CountError::InvalidNumber(number.to_string()))?;
            let bytes = (value * multiplier as f64).trunc();
            if bytes < 0.0 {
                return Ok(ByteCount::Unlimited);
            }
            if bytes >= u64::MAX as f64 {
                return Err(CountError::Overflow(s.to_string()));
            }
            return Ok(ByteCount::Exactly(bytes as u64));
        }

        let value: i128 = number
            .parse()
            .map_err(|_| CountError::InvalidNumber(number.to_string()))?;
        if value < 0 {
            return Ok(ByteCount::Unlimited);
        }
        u64::try_from(value)
            .ok()
            .and_then(|value| value.checked_mul(multiplier))
            .map(ByteCount::Exactly)
            .ok_or_else(|| CountError::Overflow(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!("1024".parse(), Ok(ByteCount::Exactly(1024)));
        assert_eq!("+7".parse(), Ok(ByteCount::Exactly(7)));
        assert_eq!("0".parse(), Ok(ByteCount::Exactly(0)));
    }

    #[test]
    fn test_si_and_iec_prefixes() {
        assert_eq!("4k".parse(), Ok(ByteCount::Exactly(4_000)));
        assert_eq!("16Mi".parse(), Ok(ByteCount::Exactly(16 << 20)));
        assert_eq!("2GiB".parse(), Ok(ByteCount::Exactly(2 << 30)));
        assert_eq!("1.5k".parse(), Ok(ByteCount::Exactly(1_500)));
        assert_eq!("0.5Ki".parse(), Ok(ByteCount::Exactly(512)));
    }

    #[test]
    fn test_unlimited_forms() {
        for s in ["+Inf", "inf", "-Infinity", "-1", "-2.5k"] {
            assert_eq!(s.parse(), Ok(ByteCount::Unlimited), "{s}");
        }
    }

    #[test]
    fn test_negative_zero_is_zero() {
        for s in ["-0", "-0.0", "-0k", "-0.4"] {
            assert_eq!(s.parse(), Ok(ByteCount::Exactly(0)), "{s}");
        }
    }

    #[test]
    fn test_rejected_forms() {
        assert_eq!("".parse::<ByteCount>(), Err(CountError::Empty));
        assert_eq!("NaN".parse::<ByteCount>(), Err(CountError::NotANumber));
        assert!(matches!(
            "12q".parse::<ByteCount>(),
            Err(CountError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "1.2.3".parse::<ByteCount>(),
            Err(CountError::InvalidNumber(_))
        ));
        assert!(matches!(
            "100Ei".parse::<ByteCount>(),
            Err(CountError::Overflow(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_integers_parse_exactly(n in any::<u64>()) {
            prop_assert_eq!(n.to_string().parse(), Ok(ByteCount::Exactly(n)));
        }

        #[test]
        fn prop_kibi_prefix_scales(n in 0u64..(1 << 40)) {
            prop_assert_eq!(format!("{n}Ki").parse(), Ok(ByteCount::Exactly(n * 1024)));
        }

        #[test]
        fn prop_display_round_trips(n in any::<u64>()) {
            let count = ByteCount::Exactly(n);
            prop_assert_eq!(count.to_string().parse(), Ok(count));
        }
    }
}
