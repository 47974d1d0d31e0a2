//! Temporal function terms
//!
//! The English grammar's actions build these algebraic terms for times the
//! calendar algebra alone cannot pin down: "two weeks ago" is an interval
//! anchored in the past of *some* reference time, "next Sunday" is the
//! next instance of a day-of-week after it. Terms carry an `anchor` slot
//! that stays empty until a resolver substitutes the utterance time or a
//! prior discourse time; the core only represents anchors, it never picks
//! them.
//!
//! All terms are immutable; [`TemporalFunction::apply_anchor`] returns a
//! new term with the innermost unresolved slot filled.

use serde::{Deserialize, Serialize};

use crate::timerep::{Duration, TimeRep};
use crate::units::{TimeUnit, UnitKind};

/// Any timex value: a representation, a bare unit, or a function term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Timex {
    /// A concrete representation
    Rep(TimeRep),
    /// A bare unit ("Sunday" before it lands anywhere)
    Unit(TimeUnit),
    /// A function term
    Function(Box<TemporalFunction>),
}

impl From<TimeRep> for Timex {
    fn from(r: TimeRep) -> Self {
        Timex::Rep(r)
    }
}

impl From<TimeUnit> for Timex {
    fn from(u: TimeUnit) -> Self {
        Timex::Unit(u)
    }
}

impl From<TemporalFunction> for Timex {
    fn from(f: TemporalFunction) -> Self {
        Timex::Function(Box::new(f))
    }
}

/// An algebraic term denoting an under-specified time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemporalFunction {
    /// The time of utterance ("now")
    UtteranceTime,
    /// A previously mentioned discourse time
    ReferenceTime,
    /// An indefinite time in the past ("the past", "recently")
    IndefPast {
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// An indefinite time in the future
    IndefFuture {
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// An indefinite time point ("sometime")
    IndefTimePoint {
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The interval reaching `duration` back from the anchor ("two weeks ago")
    PastAnchoredInterval {
        /// How far back the interval reaches
        duration: Duration,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The interval reaching `duration` forward from the anchor
    FutureAnchoredInterval {
        /// How far forward the interval reaches
        duration: Duration,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The point `duration` before the anchor
    PastAnchoredTimePoint {
        /// Distance back from the anchor
        duration: Duration,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The point `duration` after the anchor ("two weeks from now")
    FutureAnchoredTimePoint {
        /// Distance forward from the anchor
        duration: Duration,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The anchor moved forward one `unit` ("tomorrow", "next week")
    Increment {
        /// The unit of movement
        unit: UnitKind,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The anchor moved back one `unit` ("yesterday", "last month")
    Decrement {
        /// The unit of movement
        unit: UnitKind,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The next instance of a time point after the anchor ("next Sunday")
    NextInstance {
        /// The recurring point
        instance: Timex,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// The last instance of a time point before the anchor
    LastInstance {
        /// The recurring point
        instance: Timex,
        /// Resolution anchor, if substituted
        anchor: Option<Timex>,
    },
    /// A time point reinterpreted at another granularity ("the month" of a
    /// day-precision anchor)
    CoercedTimePoint {
        /// The point being coerced; empty until anchored
        point: Option<Timex>,
        /// The target granularity
        unit: UnitKind,
    },
    /// A bare plural ("Sundays")
    GenericPlural {
        /// The recurring unit value
        unit: Timex,
    },
    /// The beginning of another timex ("the start of the month")
    BeginAnchoredTimex {
        /// The timex whose beginning is meant
        timex: Timex,
        /// TimeML id of this timex, when known
        tid: Option<String>,
        /// TimeML id of the anchor, when known
        anchor_tid: Option<String>,
    },
    /// The end of another timex
    EndAnchoredTimex {
        /// The timex whose end is meant
        timex: Timex,
        /// TimeML id of this timex, when known
        tid: Option<String>,
        /// TimeML id of the anchor, when known
        anchor_tid: Option<String>,
    },
    /// A modified timex ("early October", "about three weeks")
    Mod {
        /// The modifier label
        modifier: String,
        /// The wrapped timex
        timex: Timex,
    },
    /// A frequency of occurrence ("twice a week")
    Freq {
        /// The wrapped timex
        timex: Timex,
        /// The frequency label
        frequency: String,
    },
    /// A quantified timex ("every Sunday")
    Quant {
        /// The quantifier label
        quantifier: String,
        /// The wrapped timex
        timex: Timex,
    },
}

impl TemporalFunction {
    /// Substitute the innermost unresolved anchor slot once
    ///
    /// Already-resolved subterms are left untouched: when the slot is
    /// itself a function, the substitution recurses into it instead of
    /// overwriting it.
    pub fn apply_anchor(&self, anchor: &Timex) -> TemporalFunction {
        use TemporalFunction::*;
        let substitute = |slot: &Option<Timex>| -> Option<Timex> {
            match slot {
                None => Some(anchor.clone()),
                Some(Timex::Function(f)) => {
                    Some(Timex::Function(Box::new(f.apply_anchor(anchor))))
                }
                Some(resolved) => Some(resolved.clone()),
            }
        };
        match self {
            UtteranceTime => UtteranceTime,
            ReferenceTime => ReferenceTime,
            IndefPast { anchor: a } => IndefPast { anchor: substitute(a) },
            IndefFuture { anchor: a } => IndefFuture { anchor: substitute(a) },
            IndefTimePoint { anchor: a } => IndefTimePoint { anchor: substitute(a) },
            PastAnchoredInterval { duration, anchor: a } => PastAnchoredInterval {
                duration: *duration,
                anchor: substitute(a),
            },
            FutureAnchoredInterval { duration, anchor: a } => FutureAnchoredInterval {
                duration: *duration,
                anchor: substitute(a),
            },
            PastAnchoredTimePoint { duration, anchor: a } => PastAnchoredTimePoint {
                duration: *duration,
                anchor: substitute(a),
            },
            FutureAnchoredTimePoint { duration, anchor: a } => FutureAnchoredTimePoint {
                duration: *duration,
                anchor: substitute(a),
            },
            Increment { unit, anchor: a } => Increment {
                unit: *unit,
                anchor: substitute(a),
            },
            Decrement { unit, anchor: a } => Decrement {
                unit: *unit,
                anchor: substitute(a),
            },
            NextInstance { instance, anchor: a } => NextInstance {
                instance: instance.clone(),
                anchor: substitute(a),
            },
            LastInstance { instance, anchor: a } => LastInstance {
                instance: instance.clone(),
                anchor: substitute(a),
            },
            CoercedTimePoint { point, unit } => CoercedTimePoint {
                point: substitute(point),
                unit: *unit,
            },
            GenericPlural { unit } => GenericPlural { unit: unit.clone() },
            BeginAnchoredTimex { timex, tid, anchor_tid } => BeginAnchoredTimex {
                timex: apply_to_timex(timex, anchor),
                tid: tid.clone(),
                anchor_tid: anchor_tid.clone(),
            },
            EndAnchoredTimex { timex, tid, anchor_tid } => EndAnchoredTimex {
                timex: apply_to_timex(timex, anchor),
                tid: tid.clone(),
                anchor_tid: anchor_tid.clone(),
            },
            Mod { modifier, timex } => Mod {
                modifier: modifier.clone(),
                timex: apply_to_timex(timex, anchor),
            },
            Freq { timex, frequency } => Freq {
                timex: apply_to_timex(timex, anchor),
                frequency: frequency.clone(),
            },
            Quant { quantifier, timex } => Quant {
                quantifier: quantifier.clone(),
                timex: apply_to_timex(timex, anchor),
            },
        }
    }

    /// True when this term still has an empty anchor slot somewhere
    pub fn unanchored(&self) -> bool {
        use TemporalFunction::*;
        let slot_open = |slot: &Option<Timex>| match slot {
            None => true,
            Some(Timex::Function(f)) => f.unanchored(),
            Some(_) => false,
        };
        match self {
            UtteranceTime | ReferenceTime => false,
            IndefPast { anchor }
            | IndefFuture { anchor }
            | IndefTimePoint { anchor }
            | PastAnchoredInterval { anchor, .. }
            | FutureAnchoredInterval { anchor, .. }
            | PastAnchoredTimePoint { anchor, .. }
            | FutureAnchoredTimePoint { anchor, .. }
            | Increment { anchor, .. }
            | Decrement { anchor, .. }
            | NextInstance { anchor, .. }
            | LastInstance { anchor, .. } => slot_open(anchor),
            CoercedTimePoint { point, .. } => slot_open(point),
            GenericPlural { .. } => false,
            BeginAnchoredTimex { timex, .. }
            | EndAnchoredTimex { timex, .. }
            | Mod { timex, .. }
            | Freq { timex, .. }
            | Quant { timex, .. } => match timex {
                Timex::Function(f) => f.unanchored(),
                _ => false,
            },
        }
    }

    /// The variant's name, for diagnostics and features
    pub fn variant_name(&self) -> &'static str {
        use TemporalFunction::*;
        match self {
            UtteranceTime => "UtteranceTime",
            ReferenceTime => "ReferenceTime",
            IndefPast { .. } => "IndefPast",
            IndefFuture { .. } => "IndefFuture",
            IndefTimePoint { .. } => "IndefTimePoint",
            PastAnchoredInterval { .. } => "PastAnchoredInterval",
            FutureAnchoredInterval { .. } => "FutureAnchoredInterval",
            PastAnchoredTimePoint { .. } => "PastAnchoredTimePoint",
            FutureAnchoredTimePoint { .. } => "FutureAnchoredTimePoint",
            Increment { .. } => "Increment",
            Decrement { .. } => "Decrement",
            NextInstance { .. } => "NextInstance",
            LastInstance { .. } => "LastInstance",
            CoercedTimePoint { .. } => "CoercedTimePoint",
            GenericPlural { .. } => "GenericPlural",
            BeginAnchoredTimex { .. } => "BeginAnchoredTimex",
            EndAnchoredTimex { .. } => "EndAnchoredTimex",
            Mod { .. } => "Mod",
            Freq { .. } => "Freq",
            Quant { .. } => "Quant",
        }
    }
}

fn apply_to_timex(timex: &Timex, anchor: &Timex) -> Timex {
    match timex {
        Timex::Function(f) => Timex::Function(Box::new(f.apply_anchor(anchor))),
        other => other.clone(),
    }
}
