//! Error types for tempus
//!
//! Each stage of the pipeline has its own error family: time-value
//! construction, format reading, grammar construction, grammar-spec
//! compilation, and attribute evaluation. All of them implement
//! [`std::error::Error`] and convert upward where a stage wraps another.

use std::fmt;

use crate::units::UnitKind;

/// A time-unit value outside the declared range of its kind
///
/// Raised at construction time; see [`crate::units::TimeUnit::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTimeUnit {
    /// The unit kind that rejected the value
    pub unit: UnitKind,
    /// The offending value
    pub value: i64,
}

impl fmt::Display for InvalidTimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.unit.name(), self.value)
    }
}

impl std::error::Error for InvalidTimeUnit {}

/// An ill-formed compound time representation
///
/// Raised when an accuracy reduction leaves a gap in the middle of a
/// representation, when an element has the wrong unit kind for its slot,
/// or when an interval does not match one of the four allowed shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimeRep {
    /// Human-readable description of the violation
    pub reason: String,
}

impl InvalidTimeRep {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InvalidTimeRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time representation: {}", self.reason)
    }
}

impl std::error::Error for InvalidTimeRep {}

impl From<InvalidTimeUnit> for InvalidTimeRep {
    fn from(e: InvalidTimeUnit) -> Self {
        Self::new(e.to_string())
    }
}

/// Errors from compiling or executing a format representation
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// `read()` could not advance past the given input position
    Read {
        /// Byte position in the (upper-cased) input
        pos: usize,
        /// What the last failing op expected
        expected: String,
        /// What was found instead
        got: String,
    },
    /// `read()` finished with incompatible residual stack components
    UnmergeableStack {
        /// The component on top
        top: String,
        /// The component below it
        below: String,
    },
    /// `format()` was handed an element of the wrong kind for an op
    Element {
        /// The unit kind the op declares
        expected: UnitKind,
        /// Description of what the value stream supplied
        got: String,
    },
    /// The format representation itself could not be compiled
    InvalidRepr {
        /// Character position in the representation
        pos: usize,
        /// The unexpected character
        ch: char,
    },
    /// A unit constructed during reading was out of range
    Unit(InvalidTimeUnit),
    /// A representation constructed during reading was ill-formed
    Rep(InvalidTimeRep),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Read { pos, expected, got } => {
                write!(f, "read error at {}: expected {}, got {:?}", pos, expected, got)
            }
            FormatError::UnmergeableStack { top, below } => {
                write!(f, "unmergeable components: {} over {}", top, below)
            }
            FormatError::Element { expected, got } => {
                write!(f, "format op expected {}, got {}", expected.name(), got)
            }
            FormatError::InvalidRepr { pos, ch } => {
                write!(f, "invalid format representation at {}: {:?}", pos, ch)
            }
            FormatError::Unit(e) => e.fmt(f),
            FormatError::Rep(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<InvalidTimeUnit> for FormatError {
    fn from(e: InvalidTimeUnit) -> Self {
        FormatError::Unit(e)
    }
}

impl From<InvalidTimeRep> for FormatError {
    fn from(e: InvalidTimeRep) -> Self {
        FormatError::Rep(e)
    }
}

/// Errors from constructing or querying a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A terminal specification was malformed (e.g. an invalid acronym)
    InvalidGrammarSpec(String),
    /// A nonterminal was referenced but never defined
    UnknownSymbol(String),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::InvalidGrammarSpec(msg) => write!(f, "invalid grammar spec: {}", msg),
            GrammarError::UnknownSymbol(sym) => write!(f, "unknown symbol: {}", sym),
        }
    }
}

impl std::error::Error for GrammarError {}

/// A lexical error in a grammar specification file
///
/// The usual cause is an unbalanced `(`, `[`, or `{` region, or an
/// unterminated string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    /// 1-based line of the offending text
    pub line: usize,
    /// 1-based column of the offending text
    pub col: usize,
    /// What went wrong
    pub message: String,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token error at {}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for TokenError {}

/// An action body that could not be compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidActionError {
    /// The action text as it appeared between the braces
    pub body: String,
    /// Why compilation failed
    pub message: String,
}

impl fmt::Display for InvalidActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid action {{ {} }}: {}", self.body, self.message)
    }
}

impl std::error::Error for InvalidActionError {}

/// Errors from compiling a grammar specification file
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarSpecError {
    /// The specification could not be tokenized
    Token(TokenError),
    /// An embedded action could not be compiled
    InvalidAction(InvalidActionError),
    /// The specification had no valid parse
    Syntax(String),
    /// The resulting grammar was ill-formed
    Grammar(GrammarError),
}

impl fmt::Display for GrammarSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSpecError::Token(e) => e.fmt(f),
            GrammarSpecError::InvalidAction(e) => e.fmt(f),
            GrammarSpecError::Syntax(msg) => write!(f, "grammar spec syntax error: {}", msg),
            GrammarSpecError::Grammar(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for GrammarSpecError {}

impl From<TokenError> for GrammarSpecError {
    fn from(e: TokenError) -> Self {
        GrammarSpecError::Token(e)
    }
}

impl From<InvalidActionError> for GrammarSpecError {
    fn from(e: InvalidActionError) -> Self {
        GrammarSpecError::InvalidAction(e)
    }
}

impl From<GrammarError> for GrammarSpecError {
    fn from(e: GrammarError) -> Self {
        GrammarSpecError::Grammar(e)
    }
}

/// A failed attribute evaluation
///
/// Produced by semantic actions: an out-of-range child index, an
/// unregistered action name, an unmergeable `+`, or a failed time-value
/// construction. A failed evaluation makes the parse it belongs to
/// ineligible; it does not abort the surrounding driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    /// What went wrong
    pub message: String,
}

impl EvalError {
    /// Create an evaluation error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evaluation error: {}", self.message)
    }
}

impl std::error::Error for EvalError {}

impl From<InvalidTimeUnit> for EvalError {
    fn from(e: InvalidTimeUnit) -> Self {
        Self::new(e.to_string())
    }
}

impl From<InvalidTimeRep> for EvalError {
    fn from(e: InvalidTimeRep) -> Self {
        Self::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_unit_display() {
        let e = InvalidTimeUnit {
            unit: UnitKind::Month,
            value: 13,
        };
        assert_eq!(e.to_string(), "invalid month: 13");
    }

    #[test]
    fn test_format_error_display() {
        let e = FormatError::Read {
            pos: 4,
            expected: "\"-\"".to_string(),
            got: "X".to_string(),
        };
        assert!(e.to_string().contains("at 4"));
    }

    #[test]
    fn test_spec_error_conversions() {
        let tok = TokenError {
            line: 2,
            col: 7,
            message: "improperly nested delimiters".to_string(),
        };
        let spec: GrammarSpecError = tok.into();
        assert!(matches!(spec, GrammarSpecError::Token(_)));
    }
}
