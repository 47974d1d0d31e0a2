//! Prelude module for convenient imports
//!
//! Brings the types most programs need into scope in one line:
//!
//! ```rust
//! use tempus::prelude::*;
//!
//! let f = Format::new("YYYY-MM-DD").unwrap();
//! assert!(f.read("1985-04-12").is_ok());
//! ```

pub use crate::action::{ActionExpr, ActionRegistry};
pub use crate::cfg::{
    AttributeGrammar, Grammar, ParseTree, Production, Symbol, TerminalMatcher, TreeNode,
};
pub use crate::earley::Parser;
pub use crate::error::{
    EvalError, FormatError, GrammarError, GrammarSpecError, InvalidActionError, InvalidTimeRep,
    InvalidTimeUnit, TokenError,
};
pub use crate::format::Format;
pub use crate::grammar_spec::{parse_grammar_spec, Bindings, TermArg, TerminalRegistry};
pub use crate::merge::Component;
pub use crate::syntax::SyntaxClass;
pub use crate::temporal::{TemporalFunction, Timex};
pub use crate::terminals::WordTerminal;
pub use crate::timerep::{
    CalendarDate, Date, DateTime, Duration, IntervalPart, OrdinalDate, RecurringTimeInterval,
    Time, TimeDuration, TimeInterval, TimeRep, UTCOffset, WeekDate,
};
pub use crate::timex::{parse, timex_grammar, tokens, Term, TermStream};
pub use crate::units::{Fraction, TimeUnit, UnitKind};
pub use crate::value::Value;
