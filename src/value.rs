//! The semantic value type
//!
//! Attribute evaluation is dynamically typed: a grammar action may return
//! a number, a time unit, a full representation, a temporal function, or a
//! raw token, and the parent action decides what to do with it. [`Value`]
//! is the closed sum of everything an action can produce.
//!
//! `Splice` is the flattening sentinel: an action that matched several
//! things but wants them surfaced individually returns a splice, and the
//! top-level driver splices its members into the output instead of
//! yielding one combined term.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EvalError;
use crate::merge::{merge, Component};
use crate::temporal::TemporalFunction;
use crate::timerep::TimeRep;
use crate::units::TimeUnit;

/// A value produced by a semantic action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value (the result of an empty production)
    Nil,
    /// An integer (English cardinals evaluate to these)
    Int(i64),
    /// A raw token
    Word(String),
    /// A bare time unit
    Unit(TimeUnit),
    /// A compound time representation
    Rep(TimeRep),
    /// A temporal function term
    Function(TemporalFunction),
    /// An ordered list of values
    List(Vec<Value>),
    /// Values to be spliced into the surrounding output
    Splice(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl Value {
    /// True for `Nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the token text, if this is a raw token
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Value::Word(w) => Some(w),
            _ => None,
        }
    }

    /// Get as time unit
    pub fn as_unit(&self) -> Option<&TimeUnit> {
        match self {
            Value::Unit(u) => Some(u),
            _ => None,
        }
    }

    /// Get as time representation
    pub fn as_rep(&self) -> Option<&TimeRep> {
        match self {
            Value::Rep(r) => Some(r),
            _ => None,
        }
    }

    /// Get as temporal function
    pub fn as_function(&self) -> Option<&TemporalFunction> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Serialize to JSON, for hand-off to downstream consumers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// `+`: integer addition, or an algebra merge on time values
    ///
    /// Mirrors piecemeal construction in grammar actions: a month plus a
    /// day of month is an anchorless calendar date.
    pub fn try_add(&self, other: &Value) -> Result<Value, EvalError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            (a, b) => {
                let ca = a.as_component().ok_or_else(|| {
                    EvalError::new(format!("cannot add {}", a.type_name()))
                })?;
                let cb = b.as_component().ok_or_else(|| {
                    EvalError::new(format!("cannot add {}", b.type_name()))
                })?;
                match merge(&ca, &cb) {
                    Some(Component::Unit(u)) => Ok(Value::Unit(u)),
                    Some(Component::Rep(r)) => Ok(Value::Rep(r)),
                    None => Err(EvalError::new(format!(
                        "unmergeable values: {} + {}",
                        ca.describe(),
                        cb.describe()
                    ))),
                }
            }
        }
    }

    /// `-`: integer or naïve same-kind unit subtraction
    pub fn try_sub(&self, other: &Value) -> Result<Value, EvalError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
            (Value::Unit(a), Value::Unit(b)) => Ok(Value::Unit(a.checked_sub(b)?)),
            (Value::Unit(a), Value::Int(b)) => {
                let rhs = TimeUnit::new(a.kind(), *b)
                    .map_err(|e| EvalError::new(e.to_string()))?;
                Ok(Value::Unit(a.checked_sub(&rhs)?))
            }
            (a, b) => Err(EvalError::new(format!(
                "cannot subtract {} from {}",
                b.type_name(),
                a.type_name()
            ))),
        }
    }

    /// `*`: integer multiplication
    pub fn try_mul(&self, other: &Value) -> Result<Value, EvalError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
            (a, b) => Err(EvalError::new(format!(
                "cannot multiply {} by {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn as_component(&self) -> Option<Component> {
        match self {
            Value::Unit(u) => Some(Component::Unit(*u)),
            Value::Rep(r) => Some(Component::Rep(r.clone())),
            _ => None,
        }
    }

    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Word(_) => "word",
            Value::Unit(_) => "unit",
            Value::Rep(_) => "representation",
            Value::Function(_) => "function",
            Value::List(_) => "list",
            Value::Splice(_) => "splice",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Word(w) => write!(f, "{:?}", w),
            Value::Unit(u) => write!(f, "{}({})", u.kind().name(), u),
            Value::Rep(r) => write!(f, "{}", r.kind_name()),
            Value::Function(func) => write!(f, "{}", func.variant_name()),
            Value::List(items) | Value::Splice(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitKind;

    #[test]
    fn test_int_arithmetic() {
        let a = Value::Int(20);
        let b = Value::Int(5);
        assert_eq!(a.try_add(&b).unwrap(), Value::Int(25));
        assert_eq!(a.try_sub(&b).unwrap(), Value::Int(15));
        assert_eq!(a.try_mul(&b).unwrap(), Value::Int(100));
    }

    #[test]
    fn test_add_merges_time_values() {
        let m = Value::Unit(TimeUnit::month(10).unwrap());
        let d = Value::Unit(TimeUnit::day_of_month(25).unwrap());
        let merged = m.try_add(&d).unwrap();
        assert!(matches!(merged, Value::Rep(TimeRep::Date(_))));
    }

    #[test]
    fn test_add_commutes_for_disjoint_slots() {
        let y = Value::Unit(TimeUnit::year(2000).unwrap());
        let m = Value::Unit(TimeUnit::month(3).unwrap());
        assert_eq!(y.try_add(&m).unwrap(), m.try_add(&y).unwrap());
    }

    #[test]
    fn test_unmergeable_add_fails() {
        let y = Value::Unit(TimeUnit::new(UnitKind::Number, 3).unwrap());
        let w = Value::Word("foo".to_string());
        assert!(y.try_add(&w).is_err());
    }

    #[test]
    fn test_json() {
        let v = Value::Int(42);
        assert_eq!(v.to_json().unwrap(), r#"{"Int":42}"#);
    }
}
