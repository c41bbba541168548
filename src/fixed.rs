//! Two-decimal fixed-point quantities.
//!
//! Every percentage and fractional size in the snapshot document is carried as an integer
//! scaled by 100 ([`Centi`]) and only turned into text at serialization time, so no value
//! in the collection path ever touches floating point.

use std::fmt;

use serde::Serialize;
use serde_json::value::RawValue;

/// Bytes per KiB.
pub const KIB: u64 = 1024;
/// Bytes per MiB.
pub const MIB: u64 = 1024 * 1024;

/// A non-negative quantity with exactly two implied decimal digits.
///
/// `Centi(12345)` represents `123.45` and serializes as the JSON number `123.45`.
///
/// # Examples
///
/// ```
/// # use docker_sysinfo::fixed::Centi;
/// assert_eq!(Centi::new(10000).to_string(), "100.00");
/// assert_eq!(Centi::new(7).to_string(), "0.07");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Centi(u64);

impl Centi {
    pub const ZERO: Centi = Centi(0);

    pub const fn new(hundredths: u64) -> Self {
        Self(hundredths)
    }

    /// Returns the raw value in hundredths.
    pub const fn hundredths(self) -> u64 {
        self.0
    }

    /// Computes `numerator * 10000 / denominator`, i.e. the ratio as a percentage with two
    /// decimals. Returns zero when `denominator` is zero.
    pub fn percent(numerator: u64, denominator: u64) -> Self {
        Self::ratio(numerator, 10_000, denominator)
    }

    /// Converts a byte count into MiB with two decimals (truncating).
    pub fn mebibytes(bytes: u64) -> Self {
        Self::ratio(bytes, 100, MIB)
    }

    /// Computes `value * scale / denominator` in 128-bit arithmetic, saturating at
    /// `u64::MAX` and returning zero for a zero denominator.
    fn ratio(value: u64, scale: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let scaled = u128::from(value) * u128::from(scale) / u128::from(denominator);
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Centi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Centi {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let raw = RawValue::from_string(self.to_string()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}
