//! Time units
//!
//! The atomic values of the ISO 8601 algebra. A [`TimeUnit`] is a named,
//! range-constrained scalar: the *ordinal* kinds position something within
//! a calendar cycle (year 1985, month 4, hour 23), the *cardinal* kinds
//! count cycles inside a duration (2 years, 10 minutes). The distinction
//! matters: a duration's "2 years" must never compare equal to the ordinal
//! "year 2".
//!
//! Units optionally carry a sign bit (so an offset's `+04` is
//! distinguishable from a plain `04`) and an exact decimal fraction with a
//! preserved digit count (so `12.50` round-trips as written).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidTimeUnit;

/// The kind of a time unit
///
/// Ordinal kinds are range-constrained; cardinal kinds are non-negative
/// and unbounded above. `Day` is the generic day kind used by format
/// representations before context resolves it to day-of-month, day-of-year,
/// or day-of-week. `Number` is a digit run read under a duration syntax,
/// typed only when a coercing designator follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Calendar year, 0–9999 by magnitude
    Year,
    /// Calendar month, 1–12
    Month,
    /// Calendar week, 1–53
    Week,
    /// Generic day, 1–366 until resolved
    Day,
    /// Day of month, 1–31
    DayOfMonth,
    /// Day of year, 1–366
    DayOfYear,
    /// Day of week, 1–7 (Monday is 1)
    DayOfWeek,
    /// Hour of day, 0–24 by magnitude (negative only as an offset)
    Hour,
    /// Minute of hour, 0–59
    Minute,
    /// Second of minute, 0–60 (leap seconds)
    Second,
    /// A count of years
    Years,
    /// A count of months
    Months,
    /// A count of weeks
    Weeks,
    /// A count of days
    Days,
    /// A count of hours
    Hours,
    /// A count of minutes
    Minutes,
    /// A count of seconds
    Seconds,
    /// A count of interval recurrences
    Recurrences,
    /// An untyped digit run awaiting coercion
    Number,
}

impl UnitKind {
    /// The inclusive range of valid magnitudes, `(min, max)`;
    /// `max == None` means unbounded above
    pub fn range(self) -> (i64, Option<i64>) {
        match self {
            UnitKind::Year => (0, Some(9999)),
            UnitKind::Month => (1, Some(12)),
            UnitKind::Week => (1, Some(53)),
            UnitKind::Day => (1, Some(366)),
            UnitKind::DayOfMonth => (1, Some(31)),
            UnitKind::DayOfYear => (1, Some(366)),
            UnitKind::DayOfWeek => (1, Some(7)),
            UnitKind::Hour => (0, Some(24)),
            UnitKind::Minute => (0, Some(59)),
            UnitKind::Second => (0, Some(60)),
            UnitKind::Years
            | UnitKind::Months
            | UnitKind::Weeks
            | UnitKind::Days
            | UnitKind::Hours
            | UnitKind::Minutes
            | UnitKind::Seconds
            | UnitKind::Recurrences
            | UnitKind::Number => (0, None),
        }
    }

    /// True for the counting kinds (including `Recurrences` and `Number`)
    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            UnitKind::Years
                | UnitKind::Months
                | UnitKind::Weeks
                | UnitKind::Days
                | UnitKind::Hours
                | UnitKind::Minutes
                | UnitKind::Seconds
                | UnitKind::Recurrences
                | UnitKind::Number
        )
    }

    /// True for any of the day kinds, generic or specific
    pub fn is_day(self) -> bool {
        matches!(
            self,
            UnitKind::Day | UnitKind::DayOfMonth | UnitKind::DayOfYear | UnitKind::DayOfWeek
        )
    }

    /// Lower-case name for error messages
    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Year => "year",
            UnitKind::Month => "month",
            UnitKind::Week => "week",
            UnitKind::Day => "day",
            UnitKind::DayOfMonth => "day of month",
            UnitKind::DayOfYear => "day of year",
            UnitKind::DayOfWeek => "day of week",
            UnitKind::Hour => "hour",
            UnitKind::Minute => "minute",
            UnitKind::Second => "second",
            UnitKind::Years => "years",
            UnitKind::Months => "months",
            UnitKind::Weeks => "weeks",
            UnitKind::Days => "days",
            UnitKind::Hours => "hours",
            UnitKind::Minutes => "minutes",
            UnitKind::Seconds => "seconds",
            UnitKind::Recurrences => "recurrences",
            UnitKind::Number => "number",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An exact decimal fraction with a preserved digit count
///
/// `Fraction { value: 5, digits: 2 }` is ".05"; the digit count is kept so
/// formatting reproduces the original image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    /// The fraction digits read as an integer
    pub value: u32,
    /// How many digits were written
    pub digits: u8,
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{:0width$}", self.value, width = self.digits as usize)
    }
}

/// A named, range-constrained time scalar
///
/// Immutable after construction; all mutating-looking operations return a
/// new value. Construction validates the magnitude against the kind's
/// declared range.
///
/// # Example
///
/// ```
/// use tempus::units::{TimeUnit, UnitKind};
///
/// let m = TimeUnit::month(4).unwrap();
/// assert_eq!(m.value(), 4);
/// assert!(TimeUnit::month(13).is_err());
/// assert!(TimeUnit::new(UnitKind::Second, 60).is_ok()); // leap second
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeUnit {
    kind: UnitKind,
    value: i64,
    signed: bool,
    fraction: Option<Fraction>,
}

impl TimeUnit {
    /// Construct a unit, validating the value against the kind's range
    ///
    /// The range check is by magnitude: `Hour` admits -5 (an offset hour)
    /// as well as 5. Negative values imply the sign bit.
    pub fn new(kind: UnitKind, value: i64) -> Result<Self, InvalidTimeUnit> {
        let (min, max) = kind.range();
        let mag = value.abs();
        let ok = mag >= min && max.map_or(true, |m| mag <= m);
        if !ok {
            return Err(InvalidTimeUnit { unit: kind, value });
        }
        Ok(Self {
            kind,
            value,
            signed: value < 0,
            fraction: None,
        })
    }

    /// Construct a unit that carries an explicit sign even when positive
    pub fn new_signed(kind: UnitKind, value: i64) -> Result<Self, InvalidTimeUnit> {
        let mut unit = Self::new(kind, value)?;
        unit.signed = true;
        Ok(unit)
    }

    /// Construct from the leading digits of a token
    ///
    /// Mirrors string construction in the grammar actions: `"25th"` is a
    /// valid day of month, `"foo"` is not.
    pub fn from_digits(kind: UnitKind, text: &str) -> Result<Self, InvalidTimeUnit> {
        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        let value = digits.parse::<i64>().map_err(|_| InvalidTimeUnit {
            unit: kind,
            value: -1,
        })?;
        Self::new(kind, value)
    }

    /// Attach a decimal fraction
    pub fn with_fraction(mut self, fraction: Fraction) -> Self {
        self.fraction = Some(fraction);
        self
    }

    /// The unit's kind
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// The unit's (possibly negative) value
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Whether this unit carries an explicit sign
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The decimal fraction, if any
    pub fn fraction(&self) -> Option<Fraction> {
        self.fraction
    }

    /// Re-type this unit to another kind, revalidating the value
    ///
    /// This is the coercion primitive: a generic `Day` becomes a
    /// `DayOfMonth` when it lands in a calendar date, an untyped `Number`
    /// becomes `Years` when a duration designator follows it.
    pub fn retype(self, kind: UnitKind) -> Result<Self, InvalidTimeUnit> {
        let (min, max) = kind.range();
        let mag = self.value.abs();
        let ok = mag >= min && max.map_or(true, |m| mag <= m);
        if !ok {
            return Err(InvalidTimeUnit {
                unit: kind,
                value: self.value,
            });
        }
        Ok(Self { kind, ..self })
    }

    /// Negate, keeping the kind
    pub fn negated(self) -> Result<Self, InvalidTimeUnit> {
        let mut unit = Self::new(self.kind, -self.value)?;
        unit.signed = true;
        unit.fraction = self.fraction;
        Ok(unit)
    }

    /// Naïve same-kind subtraction (no underflow handling)
    pub fn checked_sub(self, other: &TimeUnit) -> Result<Self, InvalidTimeUnit> {
        if self.kind != other.kind {
            return Err(InvalidTimeUnit {
                unit: self.kind,
                value: self.value - other.value,
            });
        }
        Self::new(self.kind, self.value - other.value)
    }

    // Ordinal convenience constructors.

    /// A calendar year
    pub fn year(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Year, v)
    }

    /// A calendar month
    pub fn month(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Month, v)
    }

    /// A calendar week
    pub fn week(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Week, v)
    }

    /// A day of month
    pub fn day_of_month(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::DayOfMonth, v)
    }

    /// A day of year
    pub fn day_of_year(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::DayOfYear, v)
    }

    /// A day of week (Monday is 1)
    pub fn day_of_week(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::DayOfWeek, v)
    }

    /// An hour of day
    pub fn hour(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Hour, v)
    }

    /// A minute of hour
    pub fn minute(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Minute, v)
    }

    /// A second of minute
    pub fn second(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Second, v)
    }

    // Cardinal convenience constructors.

    /// A count of years
    pub fn years(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Years, v)
    }

    /// A count of months
    pub fn months(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Months, v)
    }

    /// A count of weeks
    pub fn weeks(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Weeks, v)
    }

    /// A count of days
    pub fn days(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Days, v)
    }

    /// A count of hours
    pub fn hours(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Hours, v)
    }

    /// A count of minutes
    pub fn minutes(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Minutes, v)
    }

    /// A count of seconds
    pub fn seconds(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Seconds, v)
    }

    /// A recurrence count
    pub fn recurrences(v: i64) -> Result<Self, InvalidTimeUnit> {
        Self::new(UnitKind::Recurrences, v)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signed {
            write!(f, "{}{:02}", if self.value < 0 { "-" } else { "+" }, self.value.abs())?;
        } else {
            write!(f, "{}", self.value)?;
        }
        if let Some(frac) = self.fraction {
            write!(f, "{}", frac)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(TimeUnit::year(0).is_ok());
        assert!(TimeUnit::year(9999).is_ok());
        assert!(TimeUnit::year(10000).is_err());
        assert!(TimeUnit::month(0).is_err());
        assert!(TimeUnit::month(13).is_err());
        assert!(TimeUnit::week(54).is_err());
        assert!(TimeUnit::day_of_month(32).is_err());
        assert!(TimeUnit::day_of_year(367).is_err());
        assert!(TimeUnit::day_of_week(8).is_err());
        assert!(TimeUnit::hour(25).is_err());
        assert!(TimeUnit::minute(60).is_err());
        assert!(TimeUnit::second(60).is_ok()); // leap second
        assert!(TimeUnit::second(61).is_err());
    }

    #[test]
    fn test_negative_hour_is_offset() {
        let h = TimeUnit::hour(-5).unwrap();
        assert_eq!(h.value(), -5);
        assert!(h.is_signed());
        assert!(TimeUnit::hour(-25).is_err());
    }

    #[test]
    fn test_cardinal_unbounded() {
        assert!(TimeUnit::weeks(400).is_ok());
        assert!(TimeUnit::years(0).is_ok());
        assert!(TimeUnit::recurrences(12).is_ok());
    }

    #[test]
    fn test_days_not_created_equal() {
        let dom = TimeUnit::day_of_month(4).unwrap();
        let dow = TimeUnit::day_of_week(4).unwrap();
        let doy = TimeUnit::day_of_year(4).unwrap();
        assert_ne!(dom, dow);
        assert_ne!(dow, doy);
        assert_ne!(dom, doy);
    }

    #[test]
    fn test_ordinal_vs_cardinal() {
        let two_years = TimeUnit::years(2).unwrap();
        let year_two = TimeUnit::year(2).unwrap();
        assert_ne!(two_years, year_two);
    }

    #[test]
    fn test_from_digits() {
        let d = TimeUnit::from_digits(UnitKind::DayOfMonth, "25th").unwrap();
        assert_eq!(d.value(), 25);
        assert!(TimeUnit::from_digits(UnitKind::DayOfMonth, "32nd").is_err());
        assert!(TimeUnit::from_digits(UnitKind::Month, "foo").is_err());
    }

    #[test]
    fn test_retype() {
        let d = TimeUnit::new(UnitKind::Day, 25).unwrap();
        let dom = d.retype(UnitKind::DayOfMonth).unwrap();
        assert_eq!(dom.kind(), UnitKind::DayOfMonth);
        let d = TimeUnit::new(UnitKind::Day, 250).unwrap();
        assert!(d.retype(UnitKind::DayOfMonth).is_err());
        assert!(d.retype(UnitKind::DayOfYear).is_ok());
    }

    #[test]
    fn test_subtraction() {
        let a = TimeUnit::hour(3).unwrap();
        let b = TimeUnit::hour(2).unwrap();
        assert_eq!(a.checked_sub(&b).unwrap(), TimeUnit::hour(1).unwrap());
        let m = TimeUnit::minute(2).unwrap();
        assert!(a.checked_sub(&m).is_err());
    }

    #[test]
    fn test_negation() {
        let h = TimeUnit::hour(5).unwrap().negated().unwrap();
        assert_eq!(h.value(), -5);
        assert!(h.is_signed());
    }

    #[test]
    fn test_signed_display() {
        let h = TimeUnit::new_signed(UnitKind::Hour, 4).unwrap();
        assert_eq!(h.to_string(), "+04");
        let h = TimeUnit::hour(-5).unwrap();
        assert_eq!(h.to_string(), "-05");
    }

    #[test]
    fn test_fraction_display() {
        let s = TimeUnit::second(30)
            .unwrap()
            .with_fraction(Fraction { value: 5, digits: 2 });
        assert_eq!(s.to_string(), "30.05");
    }
}
