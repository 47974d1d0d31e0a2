//! The typed merge dispatch
//!
//! The algebra's composition rules live here as one exhaustive match over
//! [`Component`], the sum of a bare [`TimeUnit`] and a compound
//! [`TimeRep`]. What a `Year` plus a `Month` should become is decided by
//! the table, not by runtime type sniffing, and the compiler checks the
//! table for coverage.
//!
//! `merge` returns `None` when a composition is undefined — including when
//! the composed value would be ill-formed (a day of month of 32, a gap in
//! an accuracy reduction). Callers treat an undefined merge as "leave both
//! components in place"; only the format machine's final residual pass
//! turns leftover components into an error.

use serde::{Deserialize, Serialize};

use crate::error::InvalidTimeRep;
use crate::timerep::{
    CalendarDate, Date, DateTime, Duration, IntervalPart, OrdinalDate, RecurringTimeInterval,
    Time, TimeDuration, TimeInterval, TimeRep, UTCOffset, WeekDate,
};
use crate::units::{TimeUnit, UnitKind};

/// A mergeable component: a bare unit or a compound representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    /// A single time unit
    Unit(TimeUnit),
    /// A compound representation
    Rep(TimeRep),
}

impl Component {
    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            Component::Unit(u) => format!("{}({})", u.kind().name(), u.value()),
            Component::Rep(r) => r.kind_name().to_string(),
        }
    }

    /// Promote a lone component to its natural representation
    ///
    /// A residual `Year` is a calendar date known to the year; a residual
    /// cardinal is a one-component duration; an untyped `Number` has no
    /// natural representation and is rejected.
    pub fn promote(self) -> Result<TimeRep, InvalidTimeRep> {
        match self {
            Component::Rep(r) => Ok(r),
            Component::Unit(u) => match u.kind() {
                UnitKind::Year => Ok(TimeRep::Date(Date::Calendar(CalendarDate::new(
                    Some(u),
                    None,
                    None,
                )?))),
                UnitKind::Month => Ok(TimeRep::Date(Date::Calendar(CalendarDate::new(
                    None,
                    Some(u),
                    None,
                )?))),
                UnitKind::DayOfMonth => Ok(TimeRep::Date(Date::Calendar(CalendarDate::new(
                    None,
                    None,
                    Some(u),
                )?))),
                UnitKind::Week => Ok(TimeRep::Date(Date::Week(WeekDate::new(
                    None,
                    Some(u),
                    None,
                )?))),
                UnitKind::DayOfWeek => Ok(TimeRep::Date(Date::Week(WeekDate::new(
                    None,
                    None,
                    Some(u),
                )?))),
                UnitKind::Day | UnitKind::DayOfYear => Ok(TimeRep::Date(Date::Ordinal(
                    OrdinalDate::new(None, Some(u.retype(UnitKind::DayOfYear)?))?,
                ))),
                UnitKind::Hour if !u.is_signed() => {
                    Ok(TimeRep::Time(Time::new(u, None, None, None)?))
                }
                UnitKind::Hour => Ok(TimeRep::Offset(UTCOffset::new(u, None)?)),
                UnitKind::Years
                | UnitKind::Months
                | UnitKind::Weeks
                | UnitKind::Days
                | UnitKind::Hours
                | UnitKind::Minutes
                | UnitKind::Seconds => Ok(TimeRep::Duration(Duration::of(u.kind(), u.value())?)),
                UnitKind::Recurrences => Ok(TimeRep::Recurring(RecurringTimeInterval::from_count(
                    Some(u),
                )?)),
                UnitKind::Minute | UnitKind::Second | UnitKind::Number => Err(
                    InvalidTimeRep::new(format!("lone {} has no representation", u.kind().name())),
                ),
            },
        }
    }
}

impl From<TimeUnit> for Component {
    fn from(u: TimeUnit) -> Self {
        Component::Unit(u)
    }
}

impl From<TimeRep> for Component {
    fn from(r: TimeRep) -> Self {
        Component::Rep(r)
    }
}

/// Merge two components into their natural composition
///
/// Returns `None` when the composition is undefined. `a` is the earlier
/// (more significant, or left) component; order carries meaning only where
/// ISO 8601 says it does — interval end points — and is otherwise
/// insensitive.
pub fn merge(a: &Component, b: &Component) -> Option<Component> {
    use Component::{Rep, Unit};
    match (a, b) {
        (Unit(x), Unit(y)) => merge_units(*x, *y),
        (Rep(r), Unit(u)) => merge_rep_unit(r, *u),
        (Unit(u), Rep(r)) => merge_unit_rep(*u, r),
        (Rep(x), Rep(y)) => merge_reps(x, y),
    }
}

/// Merge with the end-of-read extensions enabled
///
/// A trailing signed hour against a time is an hour-only UTC offset; the
/// distinction only becomes decidable once no more digits can follow.
pub fn merge_residual(a: &Component, b: &Component) -> Option<Component> {
    if let Some(c) = merge(a, b) {
        return Some(c);
    }
    match (a, b) {
        (Component::Rep(TimeRep::Time(t)), Component::Unit(u))
            if u.kind() == UnitKind::Hour && u.is_signed() =>
        {
            let off = UTCOffset::new(*u, None).ok()?;
            Some(Component::Rep(TimeRep::Time(t.with_offset(off)?)))
        }
        (Component::Rep(TimeRep::DateTime(dt)), Component::Unit(u))
            if u.kind() == UnitKind::Hour && u.is_signed() =>
        {
            let off = UTCOffset::new(*u, None).ok()?;
            Some(Component::Rep(TimeRep::DateTime(dt.with_offset(off)?)))
        }
        _ => None,
    }
}

fn merge_units(a: TimeUnit, b: TimeUnit) -> Option<Component> {
    use UnitKind::*;
    let date = |d: Result<CalendarDate, _>| {
        d.ok().map(|d| Component::Rep(TimeRep::Date(Date::Calendar(d))))
    };
    match (a.kind(), b.kind()) {
        // Calendar dates.
        (Year, Month) => date(CalendarDate::new(Some(a), Some(b), None)),
        (Month, Year) => date(CalendarDate::new(Some(b), Some(a), None)),
        (Month, DayOfMonth) | (Month, Day) => date(CalendarDate::new(None, Some(a), Some(b))),
        (DayOfMonth, Month) => date(CalendarDate::new(None, Some(b), Some(a))),
        // Week dates.
        (Year, Week) => WeekDate::new(Some(a), Some(b), None)
            .ok()
            .map(|d| Component::Rep(TimeRep::Date(Date::Week(d)))),
        (Week, DayOfWeek) | (Week, Day) => WeekDate::new(None, Some(a), Some(b))
            .ok()
            .map(|d| Component::Rep(TimeRep::Date(Date::Week(d)))),
        // Ordinal dates: a year followed by a generic day reads as one.
        (Year, Day) | (Year, DayOfYear) => OrdinalDate::new(Some(a), Some(b))
            .ok()
            .map(|d| Component::Rep(TimeRep::Date(Date::Ordinal(d)))),
        // Times and offsets. The sign decides which one an hour starts.
        (Hour, Minute) if a.is_signed() => UTCOffset::new(a, Some(b))
            .ok()
            .map(|o| Component::Rep(TimeRep::Offset(o))),
        (Hour, Minute) => Time::new(a, Some(b), None, None)
            .ok()
            .map(|t| Component::Rep(TimeRep::Time(t))),
        // Duration components.
        (x, y) if x.is_cardinal() && y.is_cardinal() => merge_cardinals(a, b),
        _ => None,
    }
}

fn merge_cardinals(a: TimeUnit, b: TimeUnit) -> Option<Component> {
    use UnitKind::*;
    let time_kind = |k: UnitKind| matches!(k, Hours | Minutes | Seconds);
    let date_kind = |k: UnitKind| matches!(k, Years | Months | Days);
    match (a.kind(), b.kind()) {
        (x, y) if time_kind(x) && time_kind(y) && x != y => {
            let first = place_time_cardinal(None, a)?;
            let filled = first.fill(b)?;
            Some(Component::Rep(TimeRep::TimeDuration(filled)))
        }
        (x, y) if date_kind(x) && (date_kind(y) || time_kind(y)) && x != y => {
            let d = Duration::of(a.kind(), a.value()).ok()?;
            d.fill(b).map(|d| Component::Rep(TimeRep::Duration(d)))
        }
        _ => None,
    }
}

fn place_time_cardinal(td: Option<TimeDuration>, u: TimeUnit) -> Option<TimeDuration> {
    match td {
        Some(td) => td.fill(u),
        None => match u.kind() {
            UnitKind::Hours => TimeDuration::new(Some(u), None, None).ok(),
            UnitKind::Minutes => TimeDuration::new(None, Some(u), None).ok(),
            UnitKind::Seconds => TimeDuration::new(None, None, Some(u)).ok(),
            _ => None,
        },
    }
}

fn merge_rep_unit(r: &TimeRep, u: TimeUnit) -> Option<Component> {
    match r {
        TimeRep::Date(d) => {
            // A full-accuracy date followed by an unsigned hour opens the
            // time part of a date-time.
            if u.kind() == UnitKind::Hour && !u.is_signed() && !d.reduced_accuracy() {
                let time = Time::new(u, None, None, None).ok()?;
                return DateTime::new(*d, Some(time))
                    .ok()
                    .map(|dt| Component::Rep(TimeRep::DateTime(dt)));
            }
            d.fill(u).map(|d| Component::Rep(TimeRep::Date(d)))
        }
        TimeRep::Time(t) => {
            if u.is_signed() {
                return None; // resolved by merge_residual once input ends
            }
            t.fill(u).map(|t| Component::Rep(TimeRep::Time(t)))
        }
        TimeRep::Offset(o) => o.fill(u).map(|o| Component::Rep(TimeRep::Offset(o))),
        TimeRep::DateTime(dt) => {
            if u.is_signed() {
                return None;
            }
            dt.fill_time_unit(u)
                .map(|dt| Component::Rep(TimeRep::DateTime(dt)))
        }
        TimeRep::Duration(d) => d.fill(u).map(|d| Component::Rep(TimeRep::Duration(d))),
        TimeRep::TimeDuration(td) => td
            .fill(u)
            .map(|td| Component::Rep(TimeRep::TimeDuration(td))),
        TimeRep::Interval(_) | TimeRep::Recurring(_) => None,
    }
}

fn merge_unit_rep(u: TimeUnit, r: &TimeRep) -> Option<Component> {
    match r {
        // A recurrence count opens a recurring interval payload.
        _ if u.kind() == UnitKind::Recurrences => match r {
            TimeRep::DateTime(dt) => RecurringTimeInterval::from_count(Some(u))
                .ok()?
                .append(IntervalPart::Point(*dt))
                .ok()
                .map(|r| Component::Rep(TimeRep::Recurring(r))),
            TimeRep::Date(d) => RecurringTimeInterval::from_count(Some(u))
                .ok()?
                .append(IntervalPart::Point(DateTime::from_date(*d)))
                .ok()
                .map(|r| Component::Rep(TimeRep::Recurring(r))),
            TimeRep::Duration(d) => RecurringTimeInterval::from_count(Some(u))
                .ok()?
                .append(IntervalPart::Span(*d))
                .ok()
                .map(|r| Component::Rep(TimeRep::Recurring(r))),
            _ => None,
        },
        // An unsigned hour in front of an offset: "23" + "Z".
        TimeRep::Offset(o) if u.kind() == UnitKind::Hour && !u.is_signed() => {
            Time::new(u, None, None, Some(*o))
                .ok()
                .map(|t| Component::Rep(TimeRep::Time(t)))
        }
        // Otherwise filling is order-insensitive.
        _ => merge_rep_unit(r, u),
    }
}

fn merge_reps(a: &TimeRep, b: &TimeRep) -> Option<Component> {
    use TimeRep::*;
    match (a, b) {
        (Date(d), Time(t)) => crate::timerep::DateTime::new(*d, Some(*t))
            .ok()
            .map(|dt| Component::Rep(DateTime(dt))),
        (Time(t), Offset(o)) => t.with_offset(*o).map(|t| Component::Rep(Time(t))),
        (DateTime(dt), Offset(o)) => dt.with_offset(*o).map(|dt| Component::Rep(DateTime(dt))),
        (DateTime(dt), Time(t)) if dt.time().is_none() => {
            crate::timerep::DateTime::new(*dt.date(), Some(*t))
                .ok()
                .map(|dt| Component::Rep(DateTime(dt)))
        }
        // Interval formation: order carries meaning here. A bare date as
        // an end point stands for the date-time it begins.
        (DateTime(x), DateTime(y)) => Some(Component::Rep(Interval(TimeInterval::StartEnd(
            *x, *y,
        )))),
        (DateTime(x), Duration(d)) => Some(Component::Rep(Interval(
            TimeInterval::StartDuration(*x, *d),
        ))),
        (Duration(d), DateTime(x)) => Some(Component::Rep(Interval(TimeInterval::DurationEnd(
            *d, *x,
        )))),
        (Duration(d), TimeDuration(td)) => {
            d.with_time(*td).map(|d| Component::Rep(Duration(d)))
        }
        // Same-kind structural union, falling back to interval formation
        // when neither side has anything to give the other.
        (Date(x), Date(y)) => x
            .union(y)
            .map(|d| Component::Rep(Date(d)))
            .or_else(|| {
                Some(Component::Rep(Interval(TimeInterval::StartEnd(
                    crate::timerep::DateTime::from_date(*x),
                    crate::timerep::DateTime::from_date(*y),
                ))))
            }),
        (Date(x), DateTime(y)) => Some(Component::Rep(Interval(TimeInterval::StartEnd(
            crate::timerep::DateTime::from_date(*x),
            *y,
        )))),
        (DateTime(x), Date(y)) if x.time().is_some() => {
            Some(Component::Rep(Interval(TimeInterval::StartEnd(
                *x,
                crate::timerep::DateTime::from_date(*y),
            ))))
        }
        (Date(x), Duration(d)) => Some(Component::Rep(Interval(TimeInterval::StartDuration(
            crate::timerep::DateTime::from_date(*x),
            *d,
        )))),
        (Duration(d), Date(x)) => Some(Component::Rep(Interval(TimeInterval::DurationEnd(
            *d,
            crate::timerep::DateTime::from_date(*x),
        )))),
        (Time(x), Time(y)) => time_union(x, y).map(|t| Component::Rep(Time(t))),
        (Duration(x), Duration(y)) => duration_union(x, y).map(|d| Component::Rep(Duration(d))),
        // Recurring payload appends.
        (Recurring(r), DateTime(dt)) => r
            .append(IntervalPart::Point(*dt))
            .ok()
            .map(|r| Component::Rep(Recurring(r))),
        (Recurring(r), Date(d)) => r
            .append(IntervalPart::Point(crate::timerep::DateTime::from_date(*d)))
            .ok()
            .map(|r| Component::Rep(Recurring(r))),
        (Recurring(r), Duration(d)) => r
            .append(IntervalPart::Span(*d))
            .ok()
            .map(|r| Component::Rep(Recurring(r))),
        _ => None,
    }
}

fn time_union(a: &Time, b: &Time) -> Option<Time> {
    let offset = match (a.offset(), b.offset()) {
        (Some(x), _) => Some(x),
        (None, y) => y,
    };
    Time::new(
        a.hour(),
        a.minute().or_else(|| b.minute()),
        a.second().or_else(|| b.second()),
        offset,
    )
    .ok()
}

fn duration_union(a: &Duration, b: &Duration) -> Option<Duration> {
    match (a, b) {
        (
            Duration::Calendar {
                years: y1,
                months: m1,
                days: d1,
                time: t1,
            },
            Duration::Calendar {
                years: y2,
                months: m2,
                days: d2,
                time: t2,
            },
        ) => Duration::new(
            y1.or(*y2),
            m1.or(*m2),
            d1.or(*d2),
            t1.or(*t2),
        )
        .ok(),
        _ => None,
    }
}
