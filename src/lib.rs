//! Tempus - Natural-Language Temporal Expression Parser
//!
//! This crate turns English temporal expressions ("timexes") such as
//! "October 25", "two weeks ago", or "every Sunday morning" into
//! structured, machine-computable values grounded in the ISO 8601
//! calendar/time algebra, and reads and writes ISO 8601 images directly
//! ("1985-04-12T10:15:30Z", "P1Y2M15DT12H30M0S", "R12/…/…").
//!
//! It provides:
//! - A general-purpose Earley parser over attribute grammars
//! - A Yacc-like grammar DSL with sandboxed action expressions and
//!   caller-supplied action/terminal registries
//! - An ISO 8601 algebra: range-checked time units, piecemeal-buildable
//!   representations, and a typed merge dispatch
//! - A format machine compiling format representations (`YYYY-MM-DD`,
//!   `Pnn̲Ynn̲M…`) to micro-ops that both write and read images
//! - A temporal-function layer for anchored, deictic, and anaphoric
//!   references, plus a lazy top-level driver over token streams
//!
//! ## Quick start
//!
//! ```rust
//! use tempus::format::Format;
//! use tempus::timex::{parse, timex_grammar, tokens, Term};
//!
//! // Read and write ISO 8601 directly.
//! let f = Format::new("YYYY-MM-DD").unwrap();
//! let date = f.read("1985-04-12").unwrap();
//! assert_eq!(f.format(&date).unwrap(), "1985-04-12");
//!
//! // Parse English.
//! let grammar = timex_grammar().unwrap();
//! let terms: Vec<Term> = parse(&tokens("two weeks ago"), &grammar).collect();
//! assert_eq!(terms.len(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

pub mod action;
pub mod cfg;
pub mod earley;
pub mod error;
pub mod format;
pub mod grammar_spec;
pub mod merge;
pub mod regex_cache;
pub mod syntax;
pub mod temporal;
pub mod terminals;
pub mod timerep;
pub mod timex;
pub mod tokenizer;
pub mod units;
pub mod value;

pub mod prelude;

/// Re-export commonly used types for convenience
pub use crate::{
    action::{ActionExpr, ActionRegistry},
    cfg::{AttributeGrammar, Grammar, ParseTree, Production, Symbol, TerminalMatcher, TreeNode},
    earley::Parser,
    error::{
        EvalError, FormatError, GrammarError, GrammarSpecError, InvalidActionError,
        InvalidTimeRep, InvalidTimeUnit, TokenError,
    },
    format::Format,
    grammar_spec::{parse_grammar_spec, parse_grammar_spec_cached, Bindings, TerminalRegistry},
    merge::{merge, merge_residual, Component},
    temporal::{TemporalFunction, Timex},
    terminals::WordTerminal,
    timerep::{
        CalendarDate, Date, DateTime, Duration, IntervalPart, OrdinalDate,
        RecurringTimeInterval, Time, TimeDuration, TimeInterval, TimeRep, UTCOffset, WeekDate,
    },
    timex::{parse, timex_grammar, tokens, Term, TermStream},
    units::{Fraction, TimeUnit, UnitKind},
    value::Value,
};
