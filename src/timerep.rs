//! Time representations
//!
//! Compound values of the ISO 8601 algebra: dates (calendar, ordinal,
//! week), times of day, combined date-times, durations, intervals, and
//! recurring intervals. Unlike most date & time libraries, these types are
//! designed for arbitrarily ordered piecemeal construction: values start
//! partial and are filled in by the merge rules in [`crate::merge`].
//!
//! Every type checks its invariants at construction and is immutable
//! afterwards. The central invariant is *right-leaning reduced accuracy*:
//! once an element is omitted, everything less significant must be omitted
//! too. One relaxation applies to dates: the leading year may be absent
//! ("October 25"), leaving a value that waits for an anchor to supply it.

use serde::{Deserialize, Serialize};

use crate::error::InvalidTimeRep;
use crate::units::{TimeUnit, UnitKind};

/// Result of the accuracy scan over a most-significant-first element list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Accuracy {
    /// Some element after the first present one is absent
    pub reduced: bool,
    /// The most significant element is absent
    pub anchorless: bool,
}

/// Check for legitimate omissions in a most-significant-first element list
///
/// Omission gaps are allowed only before the first present element (the
/// anchorless case) or after the last present one (accuracy reduction).
/// A gap in the middle, or an entirely empty list, is an error.
pub(crate) fn check_accuracy(elements: &[Option<&TimeUnit>]) -> Result<Accuracy, InvalidTimeRep> {
    let first = elements.iter().position(|e| e.is_some());
    let last = elements.iter().rposition(|e| e.is_some());
    let (first, last) = match (first, last) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(InvalidTimeRep::new("no elements supplied")),
    };
    if elements[first..=last].iter().any(|e| e.is_none()) {
        return Err(InvalidTimeRep::new("invalid date/time accuracy reduction"));
    }
    Ok(Accuracy {
        reduced: last < elements.len() - 1,
        anchorless: first > 0,
    })
}

fn ensure_kind(
    unit: Option<TimeUnit>,
    kind: UnitKind,
    slot: &str,
) -> Result<Option<TimeUnit>, InvalidTimeRep> {
    match unit {
        None => Ok(None),
        Some(u) if u.kind() == kind => Ok(Some(u)),
        // A generic day or untyped number is re-ranged into the slot's kind.
        Some(u) if u.kind() == UnitKind::Day || u.kind() == UnitKind::Number => {
            Ok(Some(u.retype(kind)?))
        }
        Some(u) => Err(InvalidTimeRep::new(format!(
            "{} slot cannot hold a {}",
            slot,
            u.kind().name()
        ))),
    }
}

/// A calendar date: year, month, day of month (ISO 8601 §4.1.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    year: Option<TimeUnit>,
    month: Option<TimeUnit>,
    day: Option<TimeUnit>,
}

impl CalendarDate {
    /// Construct from typed elements, checking kinds and accuracy
    pub fn new(
        year: Option<TimeUnit>,
        month: Option<TimeUnit>,
        day: Option<TimeUnit>,
    ) -> Result<Self, InvalidTimeRep> {
        let year = ensure_kind(year, UnitKind::Year, "year")?;
        let month = ensure_kind(month, UnitKind::Month, "month")?;
        let day = ensure_kind(day, UnitKind::DayOfMonth, "day")?;
        check_accuracy(&[year.as_ref(), month.as_ref(), day.as_ref()])?;
        Ok(Self { year, month, day })
    }

    /// Construct from plain integers; `None` marks an omitted element
    pub fn from_ymd(
        year: impl Into<Option<i64>>,
        month: impl Into<Option<i64>>,
        day: impl Into<Option<i64>>,
    ) -> Result<Self, InvalidTimeRep> {
        let opt = |kind, v: Option<i64>| -> Result<Option<TimeUnit>, InvalidTimeRep> {
            v.map(|v| TimeUnit::new(kind, v)).transpose().map_err(Into::into)
        };
        Self::new(
            opt(UnitKind::Year, year.into())?,
            opt(UnitKind::Month, month.into())?,
            opt(UnitKind::DayOfMonth, day.into())?,
        )
    }

    /// The year element, if present
    pub fn year(&self) -> Option<TimeUnit> {
        self.year
    }

    /// The month element, if present
    pub fn month(&self) -> Option<TimeUnit> {
        self.month
    }

    /// The day-of-month element, if present
    pub fn day(&self) -> Option<TimeUnit> {
        self.day
    }

    /// True when a trailing element is absent
    pub fn reduced_accuracy(&self) -> bool {
        self.accuracy().reduced
    }

    /// True when the year is absent and must come from an anchor
    pub fn anchorless(&self) -> bool {
        self.accuracy().anchorless
    }

    fn accuracy(&self) -> Accuracy {
        // Construction validated the layout, so the scan cannot fail.
        check_accuracy(&[self.year.as_ref(), self.month.as_ref(), self.day.as_ref()])
            .unwrap_or(Accuracy { reduced: false, anchorless: false })
    }

    /// Fill the slot matching the unit's kind, if that slot is empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        let mut next = *self;
        match unit.kind() {
            UnitKind::Year if self.year.is_none() => next.year = Some(unit),
            UnitKind::Month if self.month.is_none() => next.month = Some(unit),
            k if (k == UnitKind::DayOfMonth || k == UnitKind::Day) && self.day.is_none() => {
                next.day = Some(unit.retype(UnitKind::DayOfMonth).ok()?)
            }
            _ => return None,
        }
        Self::new(next.year, next.month, next.day).ok()
    }

    /// Element-wise union with another calendar date
    ///
    /// Defined only when at least one missing slot is actually filled;
    /// two dates with nothing to give each other do not merge.
    pub fn union(&self, other: &Self) -> Option<Self> {
        let merged = Self::new(
            self.year.or(other.year),
            self.month.or(other.month),
            self.day.or(other.day),
        )
        .ok()?;
        (merged != *self).then_some(merged)
    }
}

/// An ordinal date: year, day of year (ISO 8601 §4.1.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrdinalDate {
    year: Option<TimeUnit>,
    day: Option<TimeUnit>,
}

impl OrdinalDate {
    /// Construct from typed elements, checking kinds and accuracy
    pub fn new(year: Option<TimeUnit>, day: Option<TimeUnit>) -> Result<Self, InvalidTimeRep> {
        let year = ensure_kind(year, UnitKind::Year, "year")?;
        let day = ensure_kind(day, UnitKind::DayOfYear, "day")?;
        check_accuracy(&[year.as_ref(), day.as_ref()])?;
        Ok(Self { year, day })
    }

    /// Construct from plain integers
    pub fn from_yd(
        year: impl Into<Option<i64>>,
        day: impl Into<Option<i64>>,
    ) -> Result<Self, InvalidTimeRep> {
        let opt = |kind, v: Option<i64>| -> Result<Option<TimeUnit>, InvalidTimeRep> {
            v.map(|v| TimeUnit::new(kind, v)).transpose().map_err(Into::into)
        };
        Self::new(
            opt(UnitKind::Year, year.into())?,
            opt(UnitKind::DayOfYear, day.into())?,
        )
    }

    /// The year element, if present
    pub fn year(&self) -> Option<TimeUnit> {
        self.year
    }

    /// The day-of-year element, if present
    pub fn day(&self) -> Option<TimeUnit> {
        self.day
    }

    /// True when the day is absent
    pub fn reduced_accuracy(&self) -> bool {
        self.year.is_some() && self.day.is_none()
    }

    /// True when the year is absent and must come from an anchor
    pub fn anchorless(&self) -> bool {
        self.year.is_none()
    }

    /// Fill the slot matching the unit's kind, if that slot is empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        let mut next = *self;
        match unit.kind() {
            UnitKind::Year if self.year.is_none() => next.year = Some(unit),
            k if (k == UnitKind::DayOfYear || k == UnitKind::Day) && self.day.is_none() => {
                next.day = Some(unit.retype(UnitKind::DayOfYear).ok()?)
            }
            _ => return None,
        }
        Self::new(next.year, next.day).ok()
    }

    /// Element-wise union with another ordinal date
    pub fn union(&self, other: &Self) -> Option<Self> {
        let merged = Self::new(self.year.or(other.year), self.day.or(other.day)).ok()?;
        (merged != *self).then_some(merged)
    }
}

/// A week date: year, week, day of week (ISO 8601 §4.1.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekDate {
    year: Option<TimeUnit>,
    week: Option<TimeUnit>,
    day: Option<TimeUnit>,
}

impl WeekDate {
    /// Construct from typed elements, checking kinds and accuracy
    pub fn new(
        year: Option<TimeUnit>,
        week: Option<TimeUnit>,
        day: Option<TimeUnit>,
    ) -> Result<Self, InvalidTimeRep> {
        let year = ensure_kind(year, UnitKind::Year, "year")?;
        let week = ensure_kind(week, UnitKind::Week, "week")?;
        let day = ensure_kind(day, UnitKind::DayOfWeek, "day")?;
        check_accuracy(&[year.as_ref(), week.as_ref(), day.as_ref()])?;
        Ok(Self { year, week, day })
    }

    /// Construct from plain integers
    pub fn from_ywd(
        year: impl Into<Option<i64>>,
        week: impl Into<Option<i64>>,
        day: impl Into<Option<i64>>,
    ) -> Result<Self, InvalidTimeRep> {
        let opt = |kind, v: Option<i64>| -> Result<Option<TimeUnit>, InvalidTimeRep> {
            v.map(|v| TimeUnit::new(kind, v)).transpose().map_err(Into::into)
        };
        Self::new(
            opt(UnitKind::Year, year.into())?,
            opt(UnitKind::Week, week.into())?,
            opt(UnitKind::DayOfWeek, day.into())?,
        )
    }

    /// The year element, if present
    pub fn year(&self) -> Option<TimeUnit> {
        self.year
    }

    /// The week element, if present
    pub fn week(&self) -> Option<TimeUnit> {
        self.week
    }

    /// The day-of-week element, if present
    pub fn day(&self) -> Option<TimeUnit> {
        self.day
    }

    /// True when a trailing element is absent
    pub fn reduced_accuracy(&self) -> bool {
        check_accuracy(&[self.year.as_ref(), self.week.as_ref(), self.day.as_ref()])
            .map(|a| a.reduced)
            .unwrap_or(false)
    }

    /// True when the year is absent and must come from an anchor
    pub fn anchorless(&self) -> bool {
        self.year.is_none()
    }

    /// Fill the slot matching the unit's kind, if that slot is empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        let mut next = *self;
        match unit.kind() {
            UnitKind::Year if self.year.is_none() => next.year = Some(unit),
            UnitKind::Week if self.week.is_none() => next.week = Some(unit),
            k if (k == UnitKind::DayOfWeek || k == UnitKind::Day) && self.day.is_none() => {
                next.day = Some(unit.retype(UnitKind::DayOfWeek).ok()?)
            }
            _ => return None,
        }
        Self::new(next.year, next.week, next.day).ok()
    }

    /// Element-wise union with another week date
    pub fn union(&self, other: &Self) -> Option<Self> {
        let merged = Self::new(
            self.year.or(other.year),
            self.week.or(other.week),
            self.day.or(other.day),
        )
        .ok()?;
        (merged != *self).then_some(merged)
    }
}

/// Any of the three date variants
///
/// The original design picked the variant dynamically at construction;
/// here [`Date::from_units`] is the smart constructor that returns the
/// right variant directly, keyed by which day/week kinds appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Date {
    /// Year, month, day of month
    Calendar(CalendarDate),
    /// Year, day of year
    Ordinal(OrdinalDate),
    /// Year, week, day of week
    Week(WeekDate),
}

impl Date {
    /// Pick a date variant from a loose bag of units
    ///
    /// A `DayOfYear` selects an ordinal date, a `Week` or `DayOfWeek`
    /// selects a week date, anything else a calendar date.
    pub fn from_units(units: &[TimeUnit]) -> Result<Self, InvalidTimeRep> {
        let find = |kind: UnitKind| units.iter().copied().find(|u| u.kind() == kind);
        if find(UnitKind::DayOfYear).is_some() {
            return Ok(Date::Ordinal(OrdinalDate::new(
                find(UnitKind::Year),
                find(UnitKind::DayOfYear),
            )?));
        }
        if find(UnitKind::Week).is_some() || find(UnitKind::DayOfWeek).is_some() {
            return Ok(Date::Week(WeekDate::new(
                find(UnitKind::Year),
                find(UnitKind::Week),
                find(UnitKind::DayOfWeek),
            )?));
        }
        Ok(Date::Calendar(CalendarDate::new(
            find(UnitKind::Year),
            find(UnitKind::Month),
            find(UnitKind::DayOfMonth).or_else(|| find(UnitKind::Day)),
        )?))
    }

    /// True when a trailing element is absent
    pub fn reduced_accuracy(&self) -> bool {
        match self {
            Date::Calendar(d) => d.reduced_accuracy(),
            Date::Ordinal(d) => d.reduced_accuracy(),
            Date::Week(d) => d.reduced_accuracy(),
        }
    }

    /// True when the year is absent and must come from an anchor
    pub fn anchorless(&self) -> bool {
        match self {
            Date::Calendar(d) => d.anchorless(),
            Date::Ordinal(d) => d.anchorless(),
            Date::Week(d) => d.anchorless(),
        }
    }

    /// Fill the slot matching the unit's kind, if that slot is empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        match self {
            Date::Calendar(d) => d.fill(unit).map(Date::Calendar),
            Date::Ordinal(d) => d.fill(unit).map(Date::Ordinal),
            Date::Week(d) => d.fill(unit).map(Date::Week),
        }
    }

    /// Element-wise union with another date of the same variant
    pub fn union(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Date::Calendar(a), Date::Calendar(b)) => a.union(b).map(Date::Calendar),
            (Date::Ordinal(a), Date::Ordinal(b)) => a.union(b).map(Date::Ordinal),
            (Date::Week(a), Date::Week(b)) => a.union(b).map(Date::Week),
            _ => None,
        }
    }

    /// The least significant populated element kind
    pub fn granularity(&self) -> Option<UnitKind> {
        match self {
            Date::Calendar(d) => d
                .day()
                .map(|_| UnitKind::DayOfMonth)
                .or_else(|| d.month().map(|_| UnitKind::Month))
                .or_else(|| d.year().map(|_| UnitKind::Year)),
            Date::Ordinal(d) => d
                .day()
                .map(|_| UnitKind::DayOfYear)
                .or_else(|| d.year().map(|_| UnitKind::Year)),
            Date::Week(d) => d
                .day()
                .map(|_| UnitKind::DayOfWeek)
                .or_else(|| d.week().map(|_| UnitKind::Week))
                .or_else(|| d.year().map(|_| UnitKind::Year)),
        }
    }
}

/// Difference between local time and UTC (ISO 8601 §4.2.5.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UTCOffset {
    hour: TimeUnit,
    minute: Option<TimeUnit>,
}

impl UTCOffset {
    /// Construct from a signed hour and an optional minute
    ///
    /// The hour carries its sign explicitly even when non-negative, since
    /// an offset is a difference.
    pub fn new(hour: TimeUnit, minute: Option<TimeUnit>) -> Result<Self, InvalidTimeRep> {
        if hour.kind() != UnitKind::Hour {
            return Err(InvalidTimeRep::new("offset hour slot cannot hold that kind"));
        }
        let hour = TimeUnit::new_signed(UnitKind::Hour, hour.value())?;
        let minute = ensure_kind(minute, UnitKind::Minute, "offset minute")?;
        Ok(Self { hour, minute })
    }

    /// Construct from plain integers
    pub fn from_hm(
        hour: i64,
        minute: impl Into<Option<i64>>,
    ) -> Result<Self, InvalidTimeRep> {
        let h = TimeUnit::hour(hour)?;
        let m = minute.into().map(TimeUnit::minute).transpose()?;
        Self::new(h, m)
    }

    /// The `Z` offset: zero hours from UTC
    pub fn utc() -> Self {
        Self {
            hour: TimeUnit::new_signed(UnitKind::Hour, 0).expect("zero hour is valid"),
            minute: None,
        }
    }

    /// The signed hour element
    pub fn hour(&self) -> TimeUnit {
        self.hour
    }

    /// The minute element, if present
    pub fn minute(&self) -> Option<TimeUnit> {
        self.minute
    }

    /// True when this offset designates UTC itself
    pub fn is_utc(&self) -> bool {
        self.hour.value() == 0 && self.minute.map_or(true, |m| m.value() == 0)
    }

    /// Fill the minute slot, if empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        if unit.kind() == UnitKind::Minute && self.minute.is_none() {
            return Some(Self {
                hour: self.hour,
                minute: Some(unit),
            });
        }
        None
    }
}

/// Time of day with an optional UTC offset (ISO 8601 §4.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    hour: TimeUnit,
    minute: Option<TimeUnit>,
    second: Option<TimeUnit>,
    offset: Option<UTCOffset>,
}

impl Time {
    /// Construct from typed elements, checking kinds and accuracy
    pub fn new(
        hour: TimeUnit,
        minute: Option<TimeUnit>,
        second: Option<TimeUnit>,
        offset: Option<UTCOffset>,
    ) -> Result<Self, InvalidTimeRep> {
        if hour.kind() != UnitKind::Hour {
            return Err(InvalidTimeRep::new("hour slot cannot hold that kind"));
        }
        let minute = ensure_kind(minute, UnitKind::Minute, "minute")?;
        let second = ensure_kind(second, UnitKind::Second, "second")?;
        check_accuracy(&[Some(&hour), minute.as_ref(), second.as_ref()])?;
        Ok(Self {
            hour,
            minute,
            second,
            offset,
        })
    }

    /// Construct from plain integers
    pub fn from_hms(
        hour: i64,
        minute: impl Into<Option<i64>>,
        second: impl Into<Option<i64>>,
        offset: Option<UTCOffset>,
    ) -> Result<Self, InvalidTimeRep> {
        let h = TimeUnit::hour(hour)?;
        let m = minute.into().map(TimeUnit::minute).transpose()?;
        let s = second.into().map(TimeUnit::second).transpose()?;
        Self::new(h, m, s, offset)
    }

    /// The hour element
    pub fn hour(&self) -> TimeUnit {
        self.hour
    }

    /// The minute element, if present
    pub fn minute(&self) -> Option<TimeUnit> {
        self.minute
    }

    /// The second element, if present
    pub fn second(&self) -> Option<TimeUnit> {
        self.second
    }

    /// The UTC offset, if present
    pub fn offset(&self) -> Option<UTCOffset> {
        self.offset
    }

    /// True when a trailing element is absent (the offset does not count)
    pub fn reduced_accuracy(&self) -> bool {
        self.minute.is_none() || self.second.is_none()
    }

    /// Fill the slot matching the unit's kind, if that slot is empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        let mut next = *self;
        match unit.kind() {
            UnitKind::Minute if self.minute.is_none() => next.minute = Some(unit),
            UnitKind::Second if self.second.is_none() && self.minute.is_some() => {
                next.second = Some(unit)
            }
            _ => return None,
        }
        Some(next)
    }

    /// Attach an offset, if none is present yet
    pub fn with_offset(&self, offset: UTCOffset) -> Option<Self> {
        if self.offset.is_some() {
            return None;
        }
        let mut next = *self;
        next.offset = Some(offset);
        Some(next)
    }

    /// The least significant populated element kind
    pub fn granularity(&self) -> Option<UnitKind> {
        self.second
            .map(|_| UnitKind::Second)
            .or_else(|| self.minute.map(|_| UnitKind::Minute))
            .or(Some(UnitKind::Hour))
    }
}

/// A combined date and time of day (ISO 8601 §4.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTime {
    date: Date,
    time: Option<Time>,
}

impl DateTime {
    /// Construct, enforcing that a present time requires a full date
    pub fn new(date: Date, time: Option<Time>) -> Result<Self, InvalidTimeRep> {
        if time.is_some() && date.reduced_accuracy() {
            return Err(InvalidTimeRep::new(
                "can't have a time with an incomplete date",
            ));
        }
        Ok(Self { date, time })
    }

    /// A date-only value
    pub fn from_date(date: Date) -> Self {
        Self { date, time: None }
    }

    /// The date part
    pub fn date(&self) -> &Date {
        &self.date
    }

    /// The time part, if present
    pub fn time(&self) -> Option<&Time> {
        self.time.as_ref()
    }

    /// Fill a time-of-day slot (hour, minute, second) or the offset
    pub fn fill_time_unit(&self, unit: TimeUnit) -> Option<Self> {
        let time = match (self.time, unit.kind()) {
            (None, UnitKind::Hour) if !unit.is_signed() => {
                Time::new(unit, None, None, None).ok()?
            }
            (Some(t), _) => t.fill(unit)?,
            _ => return None,
        };
        DateTime::new(self.date, Some(time)).ok()
    }

    /// Attach a UTC offset to the time part
    pub fn with_offset(&self, offset: UTCOffset) -> Option<Self> {
        let time = self.time?.with_offset(offset)?;
        DateTime::new(self.date, Some(time)).ok()
    }

    /// The least significant populated element kind
    pub fn granularity(&self) -> Option<UnitKind> {
        match &self.time {
            Some(t) => t.granularity(),
            None => self.date.granularity(),
        }
    }
}

/// The time part of a duration: hours, minutes, seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeDuration {
    hours: Option<TimeUnit>,
    minutes: Option<TimeUnit>,
    seconds: Option<TimeUnit>,
}

impl TimeDuration {
    /// Construct from typed cardinal elements
    pub fn new(
        hours: Option<TimeUnit>,
        minutes: Option<TimeUnit>,
        seconds: Option<TimeUnit>,
    ) -> Result<Self, InvalidTimeRep> {
        let hours = ensure_kind(hours, UnitKind::Hours, "hours")?;
        let minutes = ensure_kind(minutes, UnitKind::Minutes, "minutes")?;
        let seconds = ensure_kind(seconds, UnitKind::Seconds, "seconds")?;
        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            return Err(InvalidTimeRep::new("empty time duration"));
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Construct from plain integers
    pub fn from_hms(
        hours: impl Into<Option<i64>>,
        minutes: impl Into<Option<i64>>,
        seconds: impl Into<Option<i64>>,
    ) -> Result<Self, InvalidTimeRep> {
        let opt = |kind, v: Option<i64>| -> Result<Option<TimeUnit>, InvalidTimeRep> {
            v.map(|v| TimeUnit::new(kind, v)).transpose().map_err(Into::into)
        };
        Self::new(
            opt(UnitKind::Hours, hours.into())?,
            opt(UnitKind::Minutes, minutes.into())?,
            opt(UnitKind::Seconds, seconds.into())?,
        )
    }

    /// The hours element, if present
    pub fn hours(&self) -> Option<TimeUnit> {
        self.hours
    }

    /// The minutes element, if present
    pub fn minutes(&self) -> Option<TimeUnit> {
        self.minutes
    }

    /// The seconds element, if present
    pub fn seconds(&self) -> Option<TimeUnit> {
        self.seconds
    }

    /// Fill the slot matching the unit's kind, if that slot is empty
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        let mut next = *self;
        match unit.kind() {
            UnitKind::Hours if self.hours.is_none() => next.hours = Some(unit),
            UnitKind::Minutes if self.minutes.is_none() => next.minutes = Some(unit),
            UnitKind::Seconds if self.seconds.is_none() => next.seconds = Some(unit),
            _ => return None,
        }
        Some(next)
    }

    /// The least significant populated component kind
    pub fn granularity(&self) -> Option<UnitKind> {
        self.seconds
            .map(|_| UnitKind::Seconds)
            .or_else(|| self.minutes.map(|_| UnitKind::Minutes))
            .or_else(|| self.hours.map(|_| UnitKind::Hours))
    }
}

/// A duration (ISO 8601 §4.4.3)
///
/// Either calendar components with an optional time part, or a whole
/// number of weeks. Weeks never compose with the other components; the
/// variant split makes that unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    /// Years, months, days, and an optional time part
    Calendar {
        /// Count of years, if given
        years: Option<TimeUnit>,
        /// Count of months, if given
        months: Option<TimeUnit>,
        /// Count of days, if given
        days: Option<TimeUnit>,
        /// Hours/minutes/seconds part, if given
        time: Option<TimeDuration>,
    },
    /// A whole number of weeks
    Weeks(TimeUnit),
}

impl Duration {
    /// Construct a calendar duration from typed cardinal elements
    pub fn new(
        years: Option<TimeUnit>,
        months: Option<TimeUnit>,
        days: Option<TimeUnit>,
        time: Option<TimeDuration>,
    ) -> Result<Self, InvalidTimeRep> {
        let years = ensure_kind(years, UnitKind::Years, "years")?;
        let months = ensure_kind(months, UnitKind::Months, "months")?;
        let days = ensure_kind(days, UnitKind::Days, "days")?;
        if years.is_none() && months.is_none() && days.is_none() && time.is_none() {
            return Err(InvalidTimeRep::new("empty duration"));
        }
        Ok(Duration::Calendar {
            years,
            months,
            days,
            time,
        })
    }

    /// Construct a calendar duration from plain integers
    #[allow(clippy::too_many_arguments)]
    pub fn from_ymdhms(
        years: impl Into<Option<i64>>,
        months: impl Into<Option<i64>>,
        days: impl Into<Option<i64>>,
        hours: impl Into<Option<i64>>,
        minutes: impl Into<Option<i64>>,
        seconds: impl Into<Option<i64>>,
    ) -> Result<Self, InvalidTimeRep> {
        let opt = |kind, v: Option<i64>| -> Result<Option<TimeUnit>, InvalidTimeRep> {
            v.map(|v| TimeUnit::new(kind, v)).transpose().map_err(Into::into)
        };
        let (h, m, s) = (hours.into(), minutes.into(), seconds.into());
        let time = if h.is_none() && m.is_none() && s.is_none() {
            None
        } else {
            Some(TimeDuration::from_hms(h, m, s)?)
        };
        Self::new(
            opt(UnitKind::Years, years.into())?,
            opt(UnitKind::Months, months.into())?,
            opt(UnitKind::Days, days.into())?,
            time,
        )
    }

    /// Construct a weeks duration
    pub fn from_weeks(weeks: i64) -> Result<Self, InvalidTimeRep> {
        Ok(Duration::Weeks(TimeUnit::weeks(weeks)?))
    }

    /// Construct a duration of `value` in the given cardinal kind
    pub fn of(kind: UnitKind, value: i64) -> Result<Self, InvalidTimeRep> {
        let unit = TimeUnit::new(kind, value)?;
        match kind {
            UnitKind::Years => Self::new(Some(unit), None, None, None),
            UnitKind::Months => Self::new(None, Some(unit), None, None),
            UnitKind::Days => Self::new(None, None, Some(unit), None),
            UnitKind::Weeks => Ok(Duration::Weeks(unit)),
            UnitKind::Hours => Self::new(None, None, None, Some(TimeDuration::new(Some(unit), None, None)?)),
            UnitKind::Minutes => Self::new(None, None, None, Some(TimeDuration::new(None, Some(unit), None)?)),
            UnitKind::Seconds => Self::new(None, None, None, Some(TimeDuration::new(None, None, Some(unit))?)),
            _ => Err(InvalidTimeRep::new(format!(
                "{} is not a duration component",
                kind.name()
            ))),
        }
    }

    /// Fill the slot matching a cardinal unit's kind, if empty
    ///
    /// Weeks replace an otherwise empty calendar duration; they never
    /// combine with populated components.
    pub fn fill(&self, unit: TimeUnit) -> Option<Self> {
        match self {
            Duration::Calendar {
                years,
                months,
                days,
                time,
            } => {
                let (mut y, mut mo, mut d, mut t) = (*years, *months, *days, *time);
                match unit.kind() {
                    UnitKind::Years if y.is_none() => y = Some(unit),
                    UnitKind::Months if mo.is_none() => mo = Some(unit),
                    UnitKind::Days if d.is_none() => d = Some(unit),
                    UnitKind::Hours | UnitKind::Minutes | UnitKind::Seconds => {
                        t = Some(match t {
                            Some(td) => td.fill(unit)?,
                            None => match unit.kind() {
                                UnitKind::Hours => TimeDuration::new(Some(unit), None, None).ok()?,
                                UnitKind::Minutes => TimeDuration::new(None, Some(unit), None).ok()?,
                                _ => TimeDuration::new(None, None, Some(unit)).ok()?,
                            },
                        });
                    }
                    UnitKind::Weeks
                        if y.is_none() && mo.is_none() && d.is_none() && t.is_none() =>
                    {
                        return Some(Duration::Weeks(unit));
                    }
                    _ => return None,
                }
                Some(Duration::Calendar {
                    years: y,
                    months: mo,
                    days: d,
                    time: t,
                })
            }
            Duration::Weeks(_) => None,
        }
    }

    /// Attach a time part to a calendar duration without one
    pub fn with_time(&self, time: TimeDuration) -> Option<Self> {
        match self {
            Duration::Calendar {
                years,
                months,
                days,
                time: None,
            } => Some(Duration::Calendar {
                years: *years,
                months: *months,
                days: *days,
                time: Some(time),
            }),
            _ => None,
        }
    }

    /// The least significant populated component kind
    pub fn granularity(&self) -> Option<UnitKind> {
        match self {
            Duration::Weeks(_) => Some(UnitKind::Weeks),
            Duration::Calendar {
                years,
                months,
                days,
                time,
            } => {
                if let Some(t) = time {
                    if t.seconds().is_some() {
                        return Some(UnitKind::Seconds);
                    }
                    if t.minutes().is_some() {
                        return Some(UnitKind::Minutes);
                    }
                    if t.hours().is_some() {
                        return Some(UnitKind::Hours);
                    }
                }
                days.map(|_| UnitKind::Days)
                    .or_else(|| months.map(|_| UnitKind::Months))
                    .or_else(|| years.map(|_| UnitKind::Years))
            }
        }
    }
}

/// One end of a time interval: an instant or a span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalPart {
    /// A date-time end point
    Point(DateTime),
    /// A duration
    Span(Duration),
}

/// A time interval in one of the four ISO 8601 §4.4.1 shapes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInterval {
    /// a) a start and an end
    StartEnd(DateTime, DateTime),
    /// b) a duration and context information
    Duration(Duration),
    /// c) a start and a duration
    StartDuration(DateTime, Duration),
    /// d) a duration and an end
    DurationEnd(Duration, DateTime),
}

impl TimeInterval {
    /// Build an interval from one or two parts, rejecting invalid shapes
    pub fn from_parts(
        first: IntervalPart,
        second: Option<IntervalPart>,
    ) -> Result<Self, InvalidTimeRep> {
        match (first, second) {
            (IntervalPart::Span(d), None) => Ok(TimeInterval::Duration(d)),
            (IntervalPart::Point(_), None) => {
                Err(InvalidTimeRep::new("an interval needs more than a point"))
            }
            (IntervalPart::Point(a), Some(IntervalPart::Point(b))) => {
                Ok(TimeInterval::StartEnd(a, b))
            }
            (IntervalPart::Point(a), Some(IntervalPart::Span(d))) => {
                Ok(TimeInterval::StartDuration(a, d))
            }
            (IntervalPart::Span(d), Some(IntervalPart::Point(b))) => {
                Ok(TimeInterval::DurationEnd(d, b))
            }
            (IntervalPart::Span(_), Some(IntervalPart::Span(_))) => {
                Err(InvalidTimeRep::new("an interval cannot have two durations"))
            }
        }
    }
}

/// A recurring time interval (ISO 8601 §4.5)
///
/// The count is absent for unbounded recurrence. The interval payload is
/// held as up to two loose parts so the format machine can append to it
/// while reading; [`RecurringTimeInterval::interval`] assembles the final
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecurringTimeInterval {
    count: Option<TimeUnit>,
    first: Option<IntervalPart>,
    second: Option<IntervalPart>,
}

impl RecurringTimeInterval {
    /// Construct from a count and up to two interval parts
    pub fn new(
        count: Option<i64>,
        first: Option<IntervalPart>,
        second: Option<IntervalPart>,
    ) -> Result<Self, InvalidTimeRep> {
        let count = count.map(TimeUnit::recurrences).transpose()?;
        if second.is_some() && first.is_none() {
            return Err(InvalidTimeRep::new("recurring interval parts out of order"));
        }
        if let (Some(f), s) = (&first, &second) {
            // Validate the shape early; from_parts does the real check.
            TimeInterval::from_parts(f.clone(), s.clone())?;
        }
        Ok(Self {
            count,
            first,
            second,
        })
    }

    /// Construct from a recurrence unit (already typed) and no parts
    pub fn from_count(count: Option<TimeUnit>) -> Result<Self, InvalidTimeRep> {
        let count = ensure_kind(count, UnitKind::Recurrences, "recurrences")?;
        Ok(Self {
            count,
            first: None,
            second: None,
        })
    }

    /// The recurrence count; `None` means unbounded
    pub fn count(&self) -> Option<TimeUnit> {
        self.count
    }

    /// The first interval part, if present
    pub fn first(&self) -> Option<&IntervalPart> {
        self.first.as_ref()
    }

    /// The second interval part, if present
    pub fn second(&self) -> Option<&IntervalPart> {
        self.second.as_ref()
    }

    /// Append a part to the payload
    pub fn append(&self, part: IntervalPart) -> Result<Self, InvalidTimeRep> {
        match (&self.first, &self.second) {
            (None, _) => Ok(Self {
                count: self.count,
                first: Some(part),
                second: None,
            }),
            (Some(f), None) => {
                TimeInterval::from_parts(f.clone(), Some(part.clone()))?;
                Ok(Self {
                    count: self.count,
                    first: self.first.clone(),
                    second: Some(part),
                })
            }
            (Some(_), Some(_)) => Err(InvalidTimeRep::new(
                "recurring interval already has two parts",
            )),
        }
    }

    /// Assemble the payload into a proper interval, if complete
    pub fn interval(&self) -> Option<TimeInterval> {
        let first = self.first.clone()?;
        TimeInterval::from_parts(first, self.second.clone()).ok()
    }
}

/// Any time representation of the algebra
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRep {
    /// A calendar, ordinal, or week date
    Date(Date),
    /// A time of day
    Time(Time),
    /// A UTC offset on its own
    Offset(UTCOffset),
    /// A combined date and time
    DateTime(DateTime),
    /// The time part of a duration on its own
    TimeDuration(TimeDuration),
    /// A duration
    Duration(Duration),
    /// A time interval
    Interval(TimeInterval),
    /// A recurring time interval
    Recurring(RecurringTimeInterval),
}

impl TimeRep {
    /// Short name of the variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            TimeRep::Date(Date::Calendar(_)) => "calendar date",
            TimeRep::Date(Date::Ordinal(_)) => "ordinal date",
            TimeRep::Date(Date::Week(_)) => "week date",
            TimeRep::Time(_) => "time",
            TimeRep::Offset(_) => "UTC offset",
            TimeRep::DateTime(_) => "date-time",
            TimeRep::TimeDuration(_) => "time duration",
            TimeRep::Duration(_) => "duration",
            TimeRep::Interval(_) => "time interval",
            TimeRep::Recurring(_) => "recurring time interval",
        }
    }

    /// The least significant populated element kind, where defined
    pub fn granularity(&self) -> Option<UnitKind> {
        match self {
            TimeRep::Date(d) => d.granularity(),
            TimeRep::Time(t) => t.granularity(),
            TimeRep::Offset(_) => None,
            TimeRep::DateTime(dt) => dt.granularity(),
            TimeRep::TimeDuration(td) => td.granularity(),
            TimeRep::Duration(d) => d.granularity(),
            TimeRep::Interval(_) | TimeRep::Recurring(_) => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_reduction() {
        // Full accuracy.
        let d = CalendarDate::from_ymd(1985, 4, 12).unwrap();
        assert!(!d.reduced_accuracy());
        assert!(!d.anchorless());

        // Trailing omission is fine.
        let d = CalendarDate::from_ymd(1985, 4, None).unwrap();
        assert!(d.reduced_accuracy());

        let d = CalendarDate::from_ymd(1985, None, None).unwrap();
        assert!(d.reduced_accuracy());

        // A gap in the middle is not.
        assert!(CalendarDate::from_ymd(1985, None, 12).is_err());
    }

    #[test]
    fn test_anchorless_date() {
        // "October 25": the year waits for an anchor.
        let d = CalendarDate::from_ymd(None, 10, 25).unwrap();
        assert!(d.anchorless());
        assert!(!d.reduced_accuracy());
        assert_eq!(d.month().unwrap().value(), 10);
    }

    #[test]
    fn test_empty_date_rejected() {
        assert!(CalendarDate::from_ymd(None, None, None).is_err());
    }

    #[test]
    fn test_reduced_ne_full() {
        let a = CalendarDate::from_ymd(1985, 4, None).unwrap();
        let b = CalendarDate::from_ymd(1985, 4, 12).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_week_date() {
        let d = WeekDate::from_ywd(1985, 15, 5).unwrap();
        assert_eq!(d.week().unwrap().value(), 15);
        assert!(!d.reduced_accuracy());
        let d = WeekDate::from_ywd(1985, 15, None).unwrap();
        assert!(d.reduced_accuracy());
    }

    #[test]
    fn test_date_from_units() {
        let units = [
            TimeUnit::year(1985).unwrap(),
            TimeUnit::day_of_year(102).unwrap(),
        ];
        assert!(matches!(Date::from_units(&units), Ok(Date::Ordinal(_))));

        let units = [TimeUnit::year(1985).unwrap(), TimeUnit::week(15).unwrap()];
        assert!(matches!(Date::from_units(&units), Ok(Date::Week(_))));

        let units = [TimeUnit::year(1985).unwrap(), TimeUnit::month(4).unwrap()];
        assert!(matches!(Date::from_units(&units), Ok(Date::Calendar(_))));
    }

    #[test]
    fn test_time() {
        let t = Time::from_hms(23, 20, 50, None).unwrap();
        assert!(!t.reduced_accuracy());
        let t = Time::from_hms(23, None, None, None).unwrap();
        assert!(t.reduced_accuracy());
        // A gap: minute absent but second present.
        assert!(Time::new(
            TimeUnit::hour(23).unwrap(),
            None,
            Some(TimeUnit::second(10).unwrap()),
            None
        )
        .is_err());
    }

    #[test]
    fn test_utc_offset() {
        let off = UTCOffset::from_hm(-5, 0).unwrap();
        assert_eq!(off.hour().value(), -5);
        assert!(!off.is_utc());
        assert!(UTCOffset::utc().is_utc());
        assert!(UTCOffset::from_hm(0, 0).unwrap().is_utc());
    }

    #[test]
    fn test_datetime_needs_full_date() {
        let date = Date::Calendar(CalendarDate::from_ymd(1985, None, None).unwrap());
        let time = Time::from_hms(10, 15, None, None).unwrap();
        assert!(DateTime::new(date, Some(time)).is_err());

        let date = Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap());
        assert!(DateTime::new(date, Some(time)).is_ok());
    }

    #[test]
    fn test_datetime_fill() {
        let date = Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap());
        let dt = DateTime::from_date(date);
        let dt = dt.fill_time_unit(TimeUnit::hour(23).unwrap()).unwrap();
        let dt = dt.fill_time_unit(TimeUnit::minute(20).unwrap()).unwrap();
        let dt = dt.fill_time_unit(TimeUnit::second(50).unwrap()).unwrap();
        let t = dt.time().unwrap();
        assert_eq!(t.hour().value(), 23);
        assert_eq!(t.second().unwrap().value(), 50);
    }

    #[test]
    fn test_duration() {
        let d = Duration::from_ymdhms(2, 10, 15, 10, 30, 20).unwrap();
        assert_eq!(d.granularity(), Some(UnitKind::Seconds));
        let d = Duration::from_ymdhms(1, 2, None, None, None, None).unwrap();
        assert_eq!(d.granularity(), Some(UnitKind::Months));
    }

    #[test]
    fn test_weeks_duration_does_not_compose() {
        let w = Duration::from_weeks(2).unwrap();
        assert!(w.fill(TimeUnit::days(3).unwrap()).is_none());

        let d = Duration::from_ymdhms(1, None, None, None, None, None).unwrap();
        assert!(d.fill(TimeUnit::weeks(2).unwrap()).is_none());
    }

    #[test]
    fn test_interval_shapes() {
        let date = Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap());
        let point = IntervalPart::Point(DateTime::from_date(date));
        let span = IntervalPart::Span(Duration::from_weeks(2).unwrap());

        assert!(TimeInterval::from_parts(span.clone(), None).is_ok());
        assert!(TimeInterval::from_parts(point.clone(), Some(span.clone())).is_ok());
        assert!(TimeInterval::from_parts(span.clone(), Some(point.clone())).is_ok());
        assert!(TimeInterval::from_parts(point.clone(), Some(point.clone())).is_ok());
        assert!(TimeInterval::from_parts(point, None).is_err());
        assert!(TimeInterval::from_parts(span.clone(), Some(span)).is_err());
    }

    #[test]
    fn test_recurring_count() {
        assert!(RecurringTimeInterval::new(Some(12), None, None).is_ok());
        assert!(RecurringTimeInterval::new(None, None, None).is_ok());
        assert!(RecurringTimeInterval::new(Some(-1), None, None).is_err());
    }

    #[test]
    fn test_recurring_append() {
        let date = Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap());
        let point = IntervalPart::Point(DateTime::from_date(date));
        let span = IntervalPart::Span(Duration::from_weeks(1).unwrap());

        let r = RecurringTimeInterval::new(Some(12), None, None).unwrap();
        let r = r.append(point).unwrap();
        let r = r.append(span).unwrap();
        assert!(matches!(r.interval(), Some(TimeInterval::StartDuration(..))));
        assert!(r
            .append(IntervalPart::Span(Duration::from_weeks(1).unwrap()))
            .is_err());
    }
}
