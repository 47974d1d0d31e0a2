//! The English timex grammar and the top-level parse driver
//!
//! The grammar itself lives in `grammars/timex-en.grammar` (plus the
//! cardinal-number rules of `grammars/numbers-en.grammar`); this module
//! supplies the [`Bindings`] it is compiled against — the custom word
//! terminals and the registry of named actions its brace bodies call —
//! and the driver that chunks a token list into terms.
//!
//! The driver never fails wholesale: at each position it takes the longest
//! parse whose actions evaluate (a failed construction just disqualifies
//! that parse), splices [`Value::Splice`] results, and falls back to
//! yielding the leading token verbatim. Each step consumes at least one
//! token, so the stream always terminates.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::ActionRegistry;
use crate::cfg::AttributeGrammar;
use crate::earley::Parser;
use crate::error::{EvalError, GrammarSpecError};
use crate::grammar_spec::{
    parse_grammar_spec_cached, Bindings, TermArg, TerminalRegistry,
};
use crate::temporal::{TemporalFunction, Timex};
use crate::terminals::WordTerminal;
use crate::timerep::{CalendarDate, Date, Duration, Time, TimeRep};
use crate::units::{TimeUnit, UnitKind};
use crate::value::Value;

/// The built-in English timex grammar source
pub const TIMEX_GRAMMAR: &str = include_str!("../grammars/timex-en.grammar");

/// The built-in English cardinal-number grammar source
pub const NUMBER_GRAMMAR: &str = include_str!("../grammars/numbers-en.grammar");

/// Compile the built-in English timex grammar
///
/// The timex rules are concatenated with the number rules they build on.
/// Compiled grammars are cached per thread, so repeated calls are cheap.
pub fn timex_grammar() -> Result<AttributeGrammar<WordTerminal, Value>, GrammarSpecError> {
    let combined = format!("{}\n{}", TIMEX_GRAMMAR, NUMBER_GRAMMAR);
    parse_grammar_spec_cached(&combined, "timex", &bindings())
}

/// Compile the built-in English cardinal-number grammar on its own
pub fn number_grammar() -> Result<AttributeGrammar<WordTerminal, Value>, GrammarSpecError> {
    parse_grammar_spec_cached(NUMBER_GRAMMAR, "number", &bindings())
}

/// Split a sentence into parser tokens
///
/// Lower-cases, collapses whitespace, splits hyphenated words, and strips
/// clause punctuation — but keeps periods (abbreviations), slashes, and
/// colons, which the custom terminals need.
pub fn tokens(s: &str) -> Vec<String> {
    s.to_lowercase()
        .replace('-', " ")
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c| matches!(c, ',' | ';' | '!' | '?' | '(' | ')' | '"'))
                .to_string()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// One item of the driver's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A fully structured representation
    Rep(TimeRep),
    /// A bare time unit
    Unit(TimeUnit),
    /// A temporal function awaiting an anchor
    Function(TemporalFunction),
    /// A number that parsed but carried no time meaning
    Number(i64),
    /// A token the grammar did not recognize
    Word(String),
}

impl Term {
    /// Serialize to JSON, for hand-off to downstream consumers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn flatten_value(value: Value, out: &mut Vec<Term>) {
    match value {
        Value::Nil => {}
        Value::Int(n) => out.push(Term::Number(n)),
        Value::Word(w) => out.push(Term::Word(w)),
        Value::Unit(u) => out.push(Term::Unit(u)),
        Value::Rep(r) => out.push(Term::Rep(r)),
        Value::Function(f) => out.push(Term::Function(f)),
        Value::Splice(items) | Value::List(items) => {
            for item in items {
                flatten_value(item, out);
            }
        }
    }
}

/// The lazy term stream produced by [`parse`]
///
/// Iterator state is just the remaining tokens plus any terms spliced but
/// not yet yielded; each `next` runs the Earley parser over the remaining
/// tokens when the splice queue is empty.
pub struct TermStream<'g> {
    grammar: &'g AttributeGrammar<WordTerminal, Value>,
    tokens: VecDeque<String>,
    pending: VecDeque<Term>,
}

impl<'g> TermStream<'g> {
    /// Create a stream over a token list
    pub fn new(
        grammar: &'g AttributeGrammar<WordTerminal, Value>,
        tokens: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            grammar,
            tokens: tokens.into_iter().collect(),
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for TermStream<'_> {
    type Item = Term;

    fn next(&mut self) -> Option<Term> {
        loop {
            if let Some(term) = self.pending.pop_front() {
                return Some(term);
            }
            let first = self.tokens.front()?.clone();

            let remaining: Vec<String> = self.tokens.iter().cloned().collect();
            let mut parser = Parser::new(self.grammar.grammar());
            let mut advanced = false;
            if parser.parse(&remaining).is_ok() {
                for tree in parser.parses() {
                    match self.grammar.eval(&tree) {
                        Ok(value) => {
                            // Longest parse whose actions evaluate wins.
                            let consumed = tree.leaf_count().max(1);
                            for _ in 0..consumed {
                                self.tokens.pop_front();
                            }
                            let mut terms = Vec::new();
                            flatten_value(value, &mut terms);
                            self.pending.extend(terms);
                            advanced = true;
                            break;
                        }
                        Err(_) => continue,
                    }
                }
            }
            if !advanced {
                self.tokens.pop_front();
                return Some(Term::Word(first));
            }
        }
    }
}

/// Chunk a token list into terms using a timex grammar
///
/// The output interleaves structured terms with the tokens the grammar
/// could not account for, in input order.
pub fn parse<'g>(
    tokens: &[String],
    grammar: &'g AttributeGrammar<WordTerminal, Value>,
) -> TermStream<'g> {
    TermStream::new(grammar, tokens.iter().cloned())
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// The standard bindings the built-in grammars are compiled against
///
/// Callers loading their own grammar files get the same vocabulary by
/// passing these bindings to
/// [`crate::grammar_spec::parse_grammar_spec`].
pub fn bindings() -> Bindings {
    Bindings {
        terminals: Arc::new(standard_terminals()),
        actions: Arc::new(standard_actions()),
    }
}

fn standard_terminals() -> TerminalRegistry {
    let mut reg = TerminalRegistry::new();
    reg.register("Regexp", |args: &[TermArg]| {
        let pattern = args
            .first()
            .and_then(|a| a.as_str())
            .ok_or_else(|| EvalError::new("Regexp needs a pattern"))?;
        let name = args.get(1).and_then(|a| a.as_str()).unwrap_or(pattern);
        Ok(WordTerminal::regexp(pattern, name))
    });
    reg.register("Abbrev", |args: &[TermArg]| {
        let full = args
            .first()
            .and_then(|a| a.as_str())
            .ok_or_else(|| EvalError::new("Abbrev needs a word"))?;
        let min = args
            .get(1)
            .and_then(|a| a.as_int())
            .ok_or_else(|| EvalError::new("Abbrev needs a minimum length"))?;
        WordTerminal::abbrev(full, min as usize).map_err(|e| EvalError::new(e.to_string()))
    });
    reg.register("Acronym", |args: &[TermArg]| {
        let spec = args
            .first()
            .and_then(|a| a.as_str())
            .ok_or_else(|| EvalError::new("Acronym needs a word"))?;
        WordTerminal::acronym(spec).map_err(|e| EvalError::new(e.to_string()))
    });
    reg.register("DayOfMonth", |_: &[TermArg]| Ok(WordTerminal::DayOfMonth));
    reg.register("MonthNumber", |_: &[TermArg]| Ok(WordTerminal::MonthNumber));
    reg.register("SlashDate", |_: &[TermArg]| Ok(WordTerminal::SlashDate));
    reg.register("ClockTime", |_: &[TermArg]| Ok(WordTerminal::ClockTime));
    reg.register("Any", |_: &[TermArg]| Ok(WordTerminal::Any));
    reg.register("Other", |_: &[TermArg]| {
        // The grammar loader fills the literal table after assembly.
        Ok(WordTerminal::Other { words: vec![] })
    });
    reg
}

fn arg(args: &[Value], i: usize, what: &str) -> Result<Value, EvalError> {
    args.get(i)
        .cloned()
        .ok_or_else(|| EvalError::new(format!("missing argument {} ({})", i, what)))
}

fn arg_int(args: &[Value], i: usize) -> Result<i64, EvalError> {
    match arg(args, i, "integer")? {
        Value::Int(n) => Ok(n),
        other => Err(EvalError::new(format!(
            "expected an integer, got {}",
            other.type_name()
        ))),
    }
}

fn arg_word(args: &[Value], i: usize) -> Result<String, EvalError> {
    match arg(args, i, "word")? {
        Value::Word(w) => Ok(w),
        other => Err(EvalError::new(format!(
            "expected a word, got {}",
            other.type_name()
        ))),
    }
}

fn arg_duration(args: &[Value], i: usize) -> Result<Duration, EvalError> {
    match arg(args, i, "duration")? {
        Value::Rep(TimeRep::Duration(d)) => Ok(d),
        other => Err(EvalError::new(format!(
            "expected a duration, got {}",
            other.type_name()
        ))),
    }
}

fn arg_timex(args: &[Value], i: usize) -> Result<Timex, EvalError> {
    match arg(args, i, "timex")? {
        Value::Unit(u) => Ok(Timex::Unit(u)),
        Value::Rep(r) => Ok(Timex::Rep(r)),
        Value::Function(f) => Ok(Timex::Function(Box::new(f))),
        other => Err(EvalError::new(format!(
            "expected a timex, got {}",
            other.type_name()
        ))),
    }
}

/// "week" or "weeks" to the ordinal unit kind
fn ordinal_kind(word: &str) -> Result<UnitKind, EvalError> {
    match word.trim_end_matches('s') {
        "year" => Ok(UnitKind::Year),
        "month" => Ok(UnitKind::Month),
        "week" => Ok(UnitKind::Week),
        "day" => Ok(UnitKind::Day),
        "hour" => Ok(UnitKind::Hour),
        "minute" => Ok(UnitKind::Minute),
        "second" => Ok(UnitKind::Second),
        other => Err(EvalError::new(format!("not a unit word: {}", other))),
    }
}

/// "week" or "weeks" to the cardinal unit kind
fn cardinal_kind(word: &str) -> Result<UnitKind, EvalError> {
    match word.trim_end_matches('s') {
        "year" => Ok(UnitKind::Years),
        "month" => Ok(UnitKind::Months),
        "week" => Ok(UnitKind::Weeks),
        "day" => Ok(UnitKind::Days),
        "hour" => Ok(UnitKind::Hours),
        "minute" => Ok(UnitKind::Minutes),
        "second" => Ok(UnitKind::Seconds),
        other => Err(EvalError::new(format!("not a unit word: {}", other))),
    }
}

fn utterance_anchor() -> Option<Timex> {
    Some(Timex::Function(Box::new(TemporalFunction::UtteranceTime)))
}

fn standard_actions() -> ActionRegistry {
    let mut reg = ActionRegistry::new();

    reg.register("int", |args: &[Value]| {
        let w = arg_word(args, 0)?;
        let digits: String = w.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::new(format!("not a number: {}", w)))
    });

    reg.register("year", |args: &[Value]| {
        let w = arg_word(args, 0)?;
        Ok(Value::Unit(TimeUnit::from_digits(UnitKind::Year, &w)?))
    });
    reg.register("year_int", |args: &[Value]| {
        Ok(Value::Unit(TimeUnit::year(arg_int(args, 0)?)?))
    });
    reg.register("month", |args: &[Value]| {
        Ok(Value::Unit(TimeUnit::month(arg_int(args, 0)?)?))
    });
    reg.register("weekday", |args: &[Value]| {
        Ok(Value::Unit(TimeUnit::day_of_week(arg_int(args, 0)?)?))
    });
    reg.register("day_of_month", |args: &[Value]| {
        let w = arg_word(args, 0)?;
        Ok(Value::Unit(TimeUnit::from_digits(
            UnitKind::DayOfMonth,
            &w,
        )?))
    });

    reg.register("slash_date", |args: &[Value]| {
        let w = arg_word(args, 0)?;
        let mut parts = w.split('/');
        let month: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| EvalError::new("bad slash date"))?;
        let day: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| EvalError::new("bad slash date"))?;
        let year = match parts.next() {
            None => None,
            Some(y) => {
                let n: i64 = y
                    .parse()
                    .map_err(|_| EvalError::new("bad slash date year"))?;
                // Two-digit years pivot at 70.
                Some(if y.len() == 2 {
                    if n < 70 {
                        2000 + n
                    } else {
                        1900 + n
                    }
                } else {
                    n
                })
            }
        };
        let date = CalendarDate::from_ymd(year, month, day)?;
        Ok(Value::Rep(TimeRep::Date(Date::Calendar(date))))
    });

    reg.register("clock_time", |args: &[Value]| {
        let w = arg_word(args, 0)?;
        let mut parts = w.split(':');
        let hour: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| EvalError::new("bad clock time"))?;
        let minute: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| EvalError::new("bad clock time"))?;
        let second: Option<i64> = parts.next().map(|p| p.parse()).transpose().ok().flatten();
        Ok(Value::Rep(TimeRep::Time(Time::from_hms(
            hour, minute, second, None,
        )?)))
    });

    reg.register("am_pm", |args: &[Value]| {
        let hour_tok = arg_word(args, 0)?;
        let meridiem: String = arg_word(args, 1)?
            .chars()
            .filter(|c| *c != '.')
            .collect();
        let hour: i64 = hour_tok
            .parse()
            .map_err(|_| EvalError::new("bad clock hour"))?;
        let hour = match (meridiem.as_str(), hour) {
            ("am", 12) => 0,
            ("am", h) => h,
            ("pm", 12) => 12,
            ("pm", h) => h + 12,
            _ => return Err(EvalError::new("bad meridiem")),
        };
        Ok(Value::Rep(TimeRep::Time(Time::from_hms(
            hour, None, None, None,
        )?)))
    });

    reg.register("noon", |_: &[Value]| {
        Ok(Value::Rep(TimeRep::Time(Time::from_hms(
            12, 0, None, None,
        )?)))
    });
    reg.register("midnight", |_: &[Value]| {
        Ok(Value::Rep(TimeRep::Time(Time::from_hms(
            0, 0, None, None,
        )?)))
    });

    reg.register("duration", |args: &[Value]| {
        let n = arg_int(args, 0)?;
        let kind = cardinal_kind(&arg_word(args, 1)?)?;
        Ok(Value::Rep(TimeRep::Duration(Duration::of(kind, n)?)))
    });

    reg.register("past_interval", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::PastAnchoredInterval {
            duration: arg_duration(args, 0)?,
            anchor: None,
        }))
    });
    reg.register("future_interval", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::FutureAnchoredInterval {
            duration: arg_duration(args, 0)?,
            anchor: None,
        }))
    });
    reg.register("past_point", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::PastAnchoredTimePoint {
            duration: arg_duration(args, 0)?,
            anchor: None,
        }))
    });
    reg.register("future_point", |args: &[Value]| {
        // "from now" names its anchor outright.
        Ok(Value::Function(TemporalFunction::FutureAnchoredTimePoint {
            duration: arg_duration(args, 0)?,
            anchor: utterance_anchor(),
        }))
    });
    reg.register("past_point_at", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::PastAnchoredTimePoint {
            duration: arg_duration(args, 0)?,
            anchor: Some(arg_timex(args, 1)?),
        }))
    });
    reg.register("future_point_at", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::FutureAnchoredTimePoint {
            duration: arg_duration(args, 0)?,
            anchor: Some(arg_timex(args, 1)?),
        }))
    });

    reg.register("utterance", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::UtteranceTime))
    });
    reg.register("today", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::CoercedTimePoint {
            point: utterance_anchor(),
            unit: UnitKind::Day,
        }))
    });
    reg.register("yesterday", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::Decrement {
            unit: UnitKind::Day,
            anchor: utterance_anchor(),
        }))
    });
    reg.register("tomorrow", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::Increment {
            unit: UnitKind::Day,
            anchor: utterance_anchor(),
        }))
    });

    reg.register("increment", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::Increment {
            unit: ordinal_kind(&arg_word(args, 0)?)?,
            anchor: None,
        }))
    });
    reg.register("decrement", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::Decrement {
            unit: ordinal_kind(&arg_word(args, 0)?)?,
            anchor: None,
        }))
    });
    reg.register("coerced", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::CoercedTimePoint {
            point: None,
            unit: ordinal_kind(&arg_word(args, 0)?)?,
        }))
    });

    reg.register("next_instance", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::NextInstance {
            instance: arg_timex(args, 0)?,
            anchor: None,
        }))
    });
    reg.register("last_instance", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::LastInstance {
            instance: arg_timex(args, 0)?,
            anchor: None,
        }))
    });

    reg.register("indef_past", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::IndefPast { anchor: None }))
    });
    reg.register("indef_future", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::IndefFuture {
            anchor: None,
        }))
    });
    reg.register("indef_point", |_: &[Value]| {
        Ok(Value::Function(TemporalFunction::IndefTimePoint {
            anchor: None,
        }))
    });

    reg.register("generic_plural", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::GenericPlural {
            unit: arg_timex(args, 0)?,
        }))
    });

    reg.register("begin_of", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::BeginAnchoredTimex {
            timex: arg_timex(args, 0)?,
            tid: None,
            anchor_tid: None,
        }))
    });
    reg.register("end_of", |args: &[Value]| {
        Ok(Value::Function(TemporalFunction::EndAnchoredTimex {
            timex: arg_timex(args, 0)?,
            tid: None,
            anchor_tid: None,
        }))
    });

    reg.register("mod_", |args: &[Value]| {
        let modifier = arg_word(args, 0)?.to_uppercase();
        Ok(Value::Function(TemporalFunction::Mod {
            modifier,
            timex: arg_timex(args, 1)?,
        }))
    });
    reg.register("quant", |args: &[Value]| {
        let quantifier = arg_word(args, 0)?.to_uppercase();
        Ok(Value::Function(TemporalFunction::Quant {
            quantifier,
            timex: arg_timex(args, 1)?,
        }))
    });
    reg.register("freq", |args: &[Value]| {
        let timex = arg_timex(args, 0)?;
        let frequency = match arg(args, 1, "frequency")? {
            Value::Int(n) => format!("{}X", n),
            Value::Word(w) => w.to_uppercase(),
            other => {
                return Err(EvalError::new(format!(
                    "expected a frequency, got {}",
                    other.type_name()
                )))
            }
        };
        Ok(Value::Function(TemporalFunction::Freq { timex, frequency }))
    });

    reg.register("splice", |args: &[Value]| {
        Ok(Value::Splice(args.to_vec()))
    });

    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(s: &str) -> Vec<Term> {
        let grammar = timex_grammar().unwrap();
        parse(&tokens(s), &grammar).collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            tokens("Two weeks ago,  to the day!"),
            vec!["two", "weeks", "ago", "to", "the", "day"]
        );
        assert_eq!(tokens("twenty-one"), vec!["twenty", "one"]);
        assert_eq!(tokens("Jan. 5"), vec!["jan.", "5"]);
    }

    #[test]
    fn test_calendar_date_phrase() {
        let out = terms("October 25");
        assert_eq!(out.len(), 1);
        match &out[0] {
            Term::Rep(TimeRep::Date(Date::Calendar(d))) => {
                assert!(d.anchorless());
                assert_eq!(d.month().unwrap().value(), 10);
                assert_eq!(d.day().unwrap().value(), 25);
            }
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_date_with_year() {
        let out = terms("October 25 1985");
        match &out[0] {
            Term::Rep(TimeRep::Date(Date::Calendar(d))) => {
                assert_eq!(d.year().unwrap().value(), 1985);
                assert_eq!(d.day().unwrap().value(), 25);
            }
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_two_weeks_ago() {
        let out = terms("two weeks ago");
        assert_eq!(out.len(), 1);
        match &out[0] {
            Term::Function(TemporalFunction::PastAnchoredInterval { duration, anchor }) => {
                assert_eq!(*duration, Duration::from_weeks(2).unwrap());
                assert!(anchor.is_none());
            }
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_first_sunday_of_the_month() {
        let out = terms("October 25 is the first Sunday of the month");
        assert_eq!(out.len(), 7, "terms were: {:?}", out);
        assert!(matches!(
            out[0],
            Term::Rep(TimeRep::Date(Date::Calendar(_)))
        ));
        assert_eq!(out[1], Term::Word("is".into()));
        assert_eq!(out[2], Term::Word("the".into()));
        match &out[3] {
            Term::Function(TemporalFunction::NextInstance { instance, .. }) => {
                assert_eq!(
                    *instance,
                    Timex::Unit(TimeUnit::day_of_week(7).unwrap())
                );
            }
            other => panic!("unexpected term: {:?}", other),
        }
        assert_eq!(out[4], Term::Word("of".into()));
        assert_eq!(out[5], Term::Word("the".into()));
        match &out[6] {
            Term::Function(TemporalFunction::CoercedTimePoint { point, unit }) => {
                assert!(point.is_none());
                assert_eq!(*unit, UnitKind::Month);
            }
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_deictics() {
        assert!(matches!(
            terms("now")[0],
            Term::Function(TemporalFunction::UtteranceTime)
        ));
        assert!(matches!(
            terms("yesterday")[0],
            Term::Function(TemporalFunction::Decrement { unit: UnitKind::Day, .. })
        ));
        assert!(matches!(
            terms("tomorrow")[0],
            Term::Function(TemporalFunction::Increment { unit: UnitKind::Day, .. })
        ));
    }

    #[test]
    fn test_next_and_last() {
        assert!(matches!(
            terms("next week")[0],
            Term::Function(TemporalFunction::Increment { unit: UnitKind::Week, .. })
        ));
        assert!(matches!(
            terms("last month")[0],
            Term::Function(TemporalFunction::Decrement { unit: UnitKind::Month, .. })
        ));
        assert!(matches!(
            terms("next sunday")[0],
            Term::Function(TemporalFunction::NextInstance { .. })
        ));
        assert!(matches!(
            terms("last june")[0],
            Term::Function(TemporalFunction::LastInstance { .. })
        ));
    }

    #[test]
    fn test_every_sunday_morning() {
        let out = terms("every Sunday morning");
        assert_eq!(out.len(), 1);
        match &out[0] {
            Term::Function(TemporalFunction::Quant { quantifier, timex }) => {
                assert_eq!(quantifier, "EVERY");
                match timex {
                    Timex::Function(inner) => {
                        assert!(matches!(**inner, TemporalFunction::Mod { .. }));
                    }
                    other => panic!("unexpected inner timex: {:?}", other),
                }
            }
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_clock_and_slash_tokens() {
        match &terms("14:30")[0] {
            Term::Rep(TimeRep::Time(t)) => {
                assert_eq!(t.hour().value(), 14);
                assert_eq!(t.minute().unwrap().value(), 30);
            }
            other => panic!("unexpected term: {:?}", other),
        }
        match &terms("10/25/85")[0] {
            Term::Rep(TimeRep::Date(Date::Calendar(d))) => {
                assert_eq!(d.year().unwrap().value(), 1985);
                assert_eq!(d.month().unwrap().value(), 10);
            }
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_meridiem() {
        match &terms("2 pm")[0] {
            Term::Rep(TimeRep::Time(t)) => assert_eq!(t.hour().value(), 14),
            other => panic!("unexpected term: {:?}", other),
        }
    }

    #[test]
    fn test_unparsed_tokens_pass_through() {
        let out = terms("completely unrelated words");
        assert_eq!(
            out,
            vec![
                Term::Word("completely".into()),
                Term::Word("unrelated".into()),
                Term::Word("words".into()),
            ]
        );
    }

    #[test]
    fn test_number_grammar_values() {
        let grammar = number_grammar().unwrap();
        let cases = [
            ("twenty-one", 21),
            ("one hundred and thirty-seven", 137),
            ("nineteen ninety-nine", 1999),
            ("four hundred thousand nine hundred and one", 400_901),
        ];
        for (phrase, expected) in cases {
            let out: Vec<Term> = parse(&tokens(phrase), &grammar).collect();
            assert_eq!(out, vec![Term::Number(expected)], "phrase: {}", phrase);
        }
    }

    #[test]
    fn test_in_nineteen_ninety_nine() {
        let out = terms("in nineteen ninety-nine");
        // "in" only combines with durations; the year stands alone.
        assert_eq!(out[0], Term::Word("in".into()));
        assert_eq!(out[1], Term::Unit(TimeUnit::year(1999).unwrap()));
    }
}
