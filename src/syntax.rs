//! Syntax tables for format representations
//!
//! Each representation variant has three small tables: which letters stand
//! for digit elements, which characters designate something, and which
//! characters separate elements. The composition is written out as match
//! fall-through, one function per table, so there is nothing dynamic left:
//! a combined syntax (e.g. a date-time) answers for everything its parts
//! answer for, and lookups always consult the most specific table first.

use crate::units::UnitKind;

/// The syntax class a format representation is interpreted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxClass {
    /// A date of unstated variant (generic day element)
    Date,
    /// Year, month, day of month
    CalendarDate,
    /// Year, day of year
    OrdinalDate,
    /// Year, week, day of week
    WeekDate,
    /// Time of day
    Time,
    /// UTC offset
    UtcOffset,
    /// Combined date and time
    DateTime,
    /// Hours/minutes/seconds of a duration
    TimeDuration,
    /// A duration
    Duration,
    /// A time interval
    TimeInterval,
    /// A recurring time interval
    RecurringTimeInterval,
}

/// What a designator character does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignatorTarget {
    /// Consumes its literal without changing the syntax (`W` in a week date)
    Marker,
    /// Switches to a nested syntax (`T` opens the time of a date-time)
    Syntax(SyntaxClass),
    /// Postfix: retypes the element before it (`Y` after digits in a duration)
    Coerce(UnitKind),
    /// The special UTC designator `Z`
    Utc,
}

/// Look up the unit kind a digit letter stands for in this syntax
pub fn digit(class: SyntaxClass, ch: char) -> Option<UnitKind> {
    use SyntaxClass::*;
    match (class, ch) {
        (Date | DateTime | TimeInterval | RecurringTimeInterval, 'Y') => Some(UnitKind::Year),
        (Date | DateTime | TimeInterval | RecurringTimeInterval, 'M') => Some(UnitKind::Month),
        (Date | DateTime | TimeInterval | RecurringTimeInterval, 'D') => Some(UnitKind::Day),
        (Date | DateTime | TimeInterval | RecurringTimeInterval, 'w') => Some(UnitKind::Week),
        (CalendarDate, 'Y') => Some(UnitKind::Year),
        (CalendarDate, 'M') => Some(UnitKind::Month),
        (CalendarDate, 'D') => Some(UnitKind::DayOfMonth),
        (OrdinalDate, 'Y') => Some(UnitKind::Year),
        (OrdinalDate, 'D') => Some(UnitKind::DayOfYear),
        (WeekDate, 'Y') => Some(UnitKind::Year),
        (WeekDate, 'w') => Some(UnitKind::Week),
        (WeekDate, 'D') => Some(UnitKind::DayOfWeek),
        (Time | UtcOffset | DateTime | TimeInterval | RecurringTimeInterval, 'h') => {
            Some(UnitKind::Hour)
        }
        (Time | UtcOffset | DateTime | TimeInterval | RecurringTimeInterval, 'm') => {
            Some(UnitKind::Minute)
        }
        (Time | DateTime | TimeInterval | RecurringTimeInterval, 's') => Some(UnitKind::Second),
        (TimeDuration | Duration, 'n') => Some(UnitKind::Number),
        (RecurringTimeInterval, 'n') => Some(UnitKind::Recurrences),
        _ => None,
    }
}

/// Look up what a designator character does in this syntax
pub fn designator(class: SyntaxClass, ch: char) -> Option<DesignatorTarget> {
    use DesignatorTarget::*;
    use SyntaxClass::*;
    match (class, ch) {
        // The week marker of week dates.
        (Date | CalendarDate | OrdinalDate | WeekDate, 'W') => Some(Marker),
        (DateTime | TimeInterval | RecurringTimeInterval, 'W') => Some(Marker),
        // Plain time: T is only a marker; inside a date-time it opens the
        // time syntax.
        (Time, 'T') => Some(Marker),
        (DateTime | TimeInterval | RecurringTimeInterval, 'T') => Some(Syntax(Time)),
        (Time | DateTime | TimeInterval | RecurringTimeInterval, 'Z') => Some(Utc),
        // Duration designators are postfix coercions for the untyped
        // digits that precede them.
        (TimeDuration, 'H') => Some(Coerce(UnitKind::Hours)),
        (TimeDuration, 'M') => Some(Coerce(UnitKind::Minutes)),
        (TimeDuration, 'S') => Some(Coerce(UnitKind::Seconds)),
        (Duration, 'Y') => Some(Coerce(UnitKind::Years)),
        (Duration, 'M') => Some(Coerce(UnitKind::Months)),
        (Duration, 'W') => Some(Coerce(UnitKind::Weeks)),
        (Duration, 'D') => Some(Coerce(UnitKind::Days)),
        (Duration, 'T') => Some(Syntax(TimeDuration)),
        (TimeInterval | RecurringTimeInterval, 'P') => Some(Syntax(Duration)),
        (RecurringTimeInterval, 'R') => Some(Marker),
        _ => None,
    }
}

/// Look up a separator character; `Some(true)` is soft, `Some(false)` hard
///
/// A soft separator merely punctuates adjacent elements. A hard separator
/// additionally keeps the components on either side from merging with each
/// other (the interval solidus).
pub fn separator(class: SyntaxClass, ch: char) -> Option<bool> {
    use SyntaxClass::*;
    match (class, ch) {
        // Hyphen-minus and the dedicated hyphen both separate date elements.
        (Date | CalendarDate | OrdinalDate | WeekDate, '-' | '\u{2010}') => Some(true),
        (DateTime | TimeInterval | RecurringTimeInterval, '-' | '\u{2010}') => Some(true),
        (Time | UtcOffset, ':') => Some(true),
        (DateTime | TimeInterval | RecurringTimeInterval, ':') => Some(true),
        (TimeInterval | RecurringTimeInterval, '/') => Some(false),
        _ => None,
    }
}
