//! Typed form version numbers.
//!
//! Form versions are stored as strings by the catalog. Two parsing modes exist:
//!
//! - [`FormVersion::parse`] is strict and accepts only integers. It is used when comparing
//!   published versions and when renumbering at publish time.
//! - [`FormVersion::next_after`] scans stored versions leniently as floating-point numbers so
//!   that legacy values such as `"1.5"` still contribute to the next version number.
//!
//! Neither mode falls back to a default when a value cannot be parsed: a malformed version
//! string is a data-integrity fault and is reported as a [`VersionError`].

use std::fmt;
use std::str::FromStr;

/// Errors raised while interpreting a stored version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The value is not an integer.
    #[error("form version is not an integer: '{0}'")]
    NotAnInteger(String),

    /// The value is not a number at all.
    #[error("form version is not numeric: '{0}'")]
    NotNumeric(String),
}

/// The integer version of a form definition.
///
/// Versions are unique per form name and ordered numerically, so `"10"` sorts after `"9"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormVersion(i64);

impl FormVersion {
    /// Version given to the first form of a name.
    pub const INITIAL: FormVersion = FormVersion(1);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Parses a stored version that must be an integer (an optional sign followed by digits).
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::NotAnInteger`] for anything else, including `"1.0"`.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        input
            .parse::<i64>()
            .map(Self)
            .map_err(|_| VersionError::NotAnInteger(input.to_owned()))
    }

    /// The version immediately following this one.
    pub fn successor(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Computes the version that follows every version in `existing`.
    ///
    /// Each value is read as a floating-point number. With `M` the largest value seen (starting
    /// from zero), the result is [`FormVersion::INITIAL`] when `M <= 0`, and `M + 1` truncated to
    /// an integer otherwise. A set of `"0"` versions therefore still yields `1`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::NotNumeric`] on the first value that is not a number.
    pub fn next_after<I, S>(existing: I) -> Result<Self, VersionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut highest = 0f64;
        for raw in existing {
            let value = parse_magnitude(raw.as_ref())?;
            if value > highest {
                highest = value;
            }
        }

        if highest > 0f64 {
            // `as` truncates toward zero and saturates at the i64 bounds.
            Ok(Self((highest + 1f64) as i64))
        } else {
            Ok(Self::INITIAL)
        }
    }
}

fn parse_magnitude(raw: &str) -> Result<f64, VersionError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| VersionError::NotNumeric(raw.to_owned()))
}

impl fmt::Display for FormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<FormVersion> for String {
    fn from(version: FormVersion) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_integers_only() {
        assert_eq!(FormVersion::parse("3").unwrap(), FormVersion::new(3));
        assert_eq!(FormVersion::parse("-2").unwrap(), FormVersion::new(-2));
        assert!(matches!(
            FormVersion::parse("1.5"),
            Err(VersionError::NotAnInteger(v)) if v == "1.5"
        ));
        assert!(FormVersion::parse("").is_err());
        assert!(FormVersion::parse(" 2").is_err());
    }

    #[test]
    fn versions_order_numerically() {
        assert!(FormVersion::parse("10").unwrap() > FormVersion::parse("9").unwrap());
    }

    #[test]
    fn next_after_nothing_is_initial() {
        let none: [&str; 0] = [];
        assert_eq!(FormVersion::next_after(none).unwrap(), FormVersion::INITIAL);
    }

    #[test]
    fn next_after_zero_versions_is_initial() {
        assert_eq!(
            FormVersion::next_after(["0", "0"]).unwrap(),
            FormVersion::INITIAL
        );
        assert_eq!(
            FormVersion::next_after(["-3"]).unwrap(),
            FormVersion::INITIAL
        );
    }

    #[test]
    fn next_after_increments_highest() {
        assert_eq!(
            FormVersion::next_after(["1", "3", "2"]).unwrap(),
            FormVersion::new(4)
        );
    }

    #[test]
    fn next_after_truncates_legacy_fractional_versions() {
        assert_eq!(
            FormVersion::next_after(["2.7", "1"]).unwrap(),
            FormVersion::new(3)
        );
        assert_eq!(FormVersion::next_after(["0.5"]).unwrap(), FormVersion::new(1));
    }

    #[test]
    fn next_after_fails_on_garbage() {
        let err = FormVersion::next_after(["1", "draft"]).unwrap_err();
        assert_eq!(err, VersionError::NotNumeric("draft".into()));
    }

    #[test]
    fn successor_adds_one() {
        assert_eq!(FormVersion::new(4).successor(), FormVersion::new(5));
    }
}
