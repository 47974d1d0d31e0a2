//! The action expression language
//!
//! Grammar files embed semantic actions between braces: `{ _[0] + _[2] }`,
//! `{ 21 }`, `{ past_interval(_[0]) }`. Rather than evaluating arbitrary
//! code, the host compiles the body into a small, sandboxed expression
//! form: integer and string literals, references to the matched children
//! (`_` is the whole vector, `_[i]` one child), `+ - *` arithmetic — where
//! `+` on time values is an algebra merge — and calls into a registry of
//! named actions supplied by the caller.
//!
//! Everything a grammar can do at evaluation time is therefore decided by
//! what its host registers; a grammar file alone cannot reach outside the
//! registry.

use hashbrown::HashMap;
use std::sync::Arc;

use crate::cfg::ActionFn;
use crate::error::{EvalError, InvalidActionError};
use crate::value::Value;

/// A registered action callable
pub type RegistryFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// The named actions a grammar's expressions may call
#[derive(Default, Clone)]
pub struct ActionRegistry {
    fns: HashMap<String, RegistryFn>,
}

impl ActionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named action, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.fns.insert(name.into(), Arc::new(f));
    }

    /// Look up a registered action
    pub fn get(&self, name: &str) -> Option<&RegistryFn> {
        self.fns.get(name)
    }

    /// Names of all registered actions
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fns.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.fns.len())
            .finish()
    }
}

/// A compiled action expression
#[derive(Debug, Clone, PartialEq)]
pub enum ActionExpr {
    /// An integer literal
    Int(i64),
    /// A string literal, evaluating to a raw token value
    Str(String),
    /// `_`: the vector of child values
    Children,
    /// Subscript by a constant index
    Index(Box<ActionExpr>, usize),
    /// Addition, or an algebra merge on time values
    Add(Box<ActionExpr>, Box<ActionExpr>),
    /// Subtraction
    Sub(Box<ActionExpr>, Box<ActionExpr>),
    /// Multiplication
    Mul(Box<ActionExpr>, Box<ActionExpr>),
    /// A registry call with arguments
    Call(String, Vec<ActionExpr>),
    /// A bare registry name, called with no arguments
    Ident(String),
}

impl ActionExpr {
    /// Compile an action body
    pub fn parse(body: &str) -> Result<Self, InvalidActionError> {
        let mut p = ExprParser::new(body)?;
        let expr = p.expr()?;
        p.skip_ws();
        if p.pos < p.chars.len() {
            return Err(p.error("trailing characters after expression"));
        }
        Ok(expr)
    }

    /// Evaluate against the children of one parse-tree node
    pub fn eval(&self, children: &[Value], registry: &ActionRegistry) -> Result<Value, EvalError> {
        match self {
            ActionExpr::Int(n) => Ok(Value::Int(*n)),
            ActionExpr::Str(s) => Ok(Value::Word(s.clone())),
            ActionExpr::Children => Ok(Value::List(children.to_vec())),
            ActionExpr::Index(inner, i) => match inner.eval(children, registry)? {
                Value::List(items) | Value::Splice(items) => items
                    .get(*i)
                    .cloned()
                    .ok_or_else(|| EvalError::new(format!("child index {} out of range", i))),
                other => Err(EvalError::new(format!(
                    "cannot index a {}",
                    other.type_name()
                ))),
            },
            ActionExpr::Add(a, b) => a
                .eval(children, registry)?
                .try_add(&b.eval(children, registry)?),
            ActionExpr::Sub(a, b) => a
                .eval(children, registry)?
                .try_sub(&b.eval(children, registry)?),
            ActionExpr::Mul(a, b) => a
                .eval(children, registry)?
                .try_mul(&b.eval(children, registry)?),
            ActionExpr::Call(name, args) => {
                let f = registry
                    .get(name)
                    .ok_or_else(|| EvalError::new(format!("unknown action: {}", name)))?;
                let mut vals = Vec::with_capacity(args.len());
                for a in args {
                    vals.push(a.eval(children, registry)?);
                }
                f(&vals)
            }
            ActionExpr::Ident(name) => {
                let f = registry
                    .get(name)
                    .ok_or_else(|| EvalError::new(format!("unknown action: {}", name)))?;
                f(&[])
            }
        }
    }

    /// Close over a registry, yielding a grammar action
    pub fn into_action(self, registry: Arc<ActionRegistry>) -> ActionFn<Value> {
        Arc::new(move |children| self.eval(children, &registry))
    }
}

struct ExprParser {
    source: String,
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn new(body: &str) -> Result<Self, InvalidActionError> {
        if body.trim().is_empty() {
            return Err(InvalidActionError {
                body: body.to_string(),
                message: "empty action body".to_string(),
            });
        }
        Ok(Self {
            source: body.to_string(),
            chars: body.chars().collect(),
            pos: 0,
        })
    }

    fn error(&self, message: impl Into<String>) -> InvalidActionError {
        InvalidActionError {
            body: self.source.clone(),
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self
            .chars
            .get(self.pos)
            .map_or(false, |c| c.is_whitespace())
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expr(&mut self) -> Result<ActionExpr, InvalidActionError> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = ActionExpr::Add(Box::new(left), Box::new(right));
                }
                Some('-') => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = ActionExpr::Sub(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<ActionExpr, InvalidActionError> {
        let mut left = self.factor()?;
        while self.peek() == Some('*') {
            self.pos += 1;
            let right = self.factor()?;
            left = ActionExpr::Mul(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<ActionExpr, InvalidActionError> {
        let mut e = self.primary()?;
        // Constant subscripts, e.g. `_[0]`.
        while self.peek() == Some('[') {
            self.pos += 1;
            let idx = self.integer()?;
            if self.bump() != Some(']') {
                return Err(self.error("expected ] after subscript"));
            }
            e = ActionExpr::Index(Box::new(e), idx as usize);
        }
        Ok(e)
    }

    fn primary(&mut self) -> Result<ActionExpr, InvalidActionError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let e = self.expr()?;
                if self.bump() != Some(')') {
                    return Err(self.error("expected )"));
                }
                Ok(e)
            }
            Some('"') | Some('\'') => self.string(),
            Some('-') => {
                self.pos += 1;
                let n = self.integer()?;
                Ok(ActionExpr::Int(-n))
            }
            Some(c) if c.is_ascii_digit() => Ok(ActionExpr::Int(self.integer()?)),
            Some('_') if !self.ident_continues(1) => {
                self.pos += 1;
                Ok(ActionExpr::Children)
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name = self.ident();
                if self.peek() == Some('(') {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(')') {
                        loop {
                            args.push(self.expr()?);
                            match self.bump() {
                                Some(',') => continue,
                                Some(')') => break,
                                _ => return Err(self.error("expected , or ) in call")),
                            }
                        }
                    } else {
                        self.pos += 1;
                    }
                    Ok(ActionExpr::Call(name, args))
                } else {
                    Ok(ActionExpr::Ident(name))
                }
            }
            Some(c) => Err(self.error(format!("unexpected character {:?}", c))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn ident_continues(&mut self, offset: usize) -> bool {
        self.skip_ws();
        self.chars
            .get(self.pos + offset)
            .map_or(false, |c| c.is_alphanumeric() || *c == '_')
    }

    fn ident(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .map_or(false, |c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn integer(&mut self) -> Result<i64, InvalidActionError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .map_or(false, |c| c.is_ascii_digit())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected an integer"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| self.error("integer out of range"))
    }

    fn string(&mut self) -> Result<ActionExpr, InvalidActionError> {
        let quote = self.bump().unwrap_or('"');
        let mut out = String::new();
        while let Some(&c) = self.chars.get(self.pos) {
            self.pos += 1;
            if c == quote {
                return Ok(ActionExpr::Str(out));
            }
            out.push(c);
        }
        Err(self.error("unterminated string in action"))
    }
}
