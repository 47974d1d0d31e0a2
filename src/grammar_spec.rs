//! Grammar specification files
//!
//! Parses the Yacc-like external DSL into an [`AttributeGrammar`]:
//!
//! ```text
//! number -> small "hundred" small { (_[0] * 100) + _[2] }
//!     | small "hundred" { _[0] * 100 }
//! ```
//!
//! Bare names are nonterminals; `"…"` is a literal, `r"…"` a regex,
//! `"/TAG"` a part-of-speech test; `Name(args)` calls a constructor in the
//! caller's terminal registry. The braced action bodies compile through
//! [`ActionExpr`].
//!
//! The DSL is parsed by the same Earley engine it feeds: a fixed
//! meta-grammar over the tokenizer's output, whose actions are native
//! closures, assembles the productions. The registries that used to live
//! in process globals are explicit [`Bindings`] here.

use hashbrown::HashMap;
use std::cell::RefCell;
use std::sync::Arc;

use crate::action::{ActionExpr, ActionRegistry};
use crate::cfg::{ActionFn, AttributeGrammar, Production, Symbol, TerminalMatcher};
use crate::earley::Parser;
use crate::error::{EvalError, GrammarSpecError, InvalidActionError};
use crate::terminals::WordTerminal;
use crate::tokenizer::{tokenize, SpecToken, SpecTokenKind};
use crate::value::Value;

/// A terminal in the meta-grammar: a token kind, optionally with an exact
/// lexeme
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecTerminal {
    kind: SpecTokenKind,
    value: Option<String>,
}

impl SpecTerminal {
    fn kind(kind: SpecTokenKind) -> Self {
        Self { kind, value: None }
    }

    fn op(value: &str) -> Self {
        Self {
            kind: SpecTokenKind::Op,
            value: Some(value.to_string()),
        }
    }
}

impl TerminalMatcher for SpecTerminal {
    type Token = SpecToken;

    fn matches(&self, token: &SpecToken) -> bool {
        self.kind == token.kind
            && self
                .value
                .as_ref()
                .map_or(true, |v| *v == token.value)
    }
}

/// An argument to a terminal constructor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermArg {
    /// A plain string literal
    Str(String),
    /// A raw (regex) string literal
    Raw(String),
    /// An integer literal
    Int(i64),
}

impl TermArg {
    /// The string content, for constructors that take text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TermArg::Str(s) | TermArg::Raw(s) => Some(s),
            TermArg::Int(_) => None,
        }
    }

    /// The integer content
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TermArg::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// A registered terminal constructor
pub type TerminalFn = Arc<dyn Fn(&[TermArg]) -> Result<WordTerminal, EvalError> + Send + Sync>;

/// The terminal constructors a grammar file may call
#[derive(Default, Clone)]
pub struct TerminalRegistry {
    fns: HashMap<String, TerminalFn>,
}

impl TerminalRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named constructor, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[TermArg]) -> Result<WordTerminal, EvalError> + Send + Sync + 'static,
    {
        self.fns.insert(name.into(), Arc::new(f));
    }

    /// Look up a registered constructor
    pub fn get(&self, name: &str) -> Option<&TerminalFn> {
        self.fns.get(name)
    }
}

impl std::fmt::Debug for TerminalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalRegistry")
            .field("constructors", &self.fns.len())
            .finish()
    }
}

/// Everything a grammar file may reach at compile or evaluation time
#[derive(Debug, Clone)]
pub struct Bindings {
    /// Constructors callable as `Name(args)` in symbol position
    pub terminals: Arc<TerminalRegistry>,
    /// Actions callable inside `{ … }` bodies
    pub actions: Arc<ActionRegistry>,
}

impl Bindings {
    /// Bindings with empty registries
    pub fn empty() -> Self {
        Self {
            terminals: Arc::new(TerminalRegistry::new()),
            actions: Arc::new(ActionRegistry::new()),
        }
    }
}

/// One production plus its compiled action, as assembled by the meta-grammar
#[derive(Debug, Clone)]
struct ProdSpec {
    production: Production<WordTerminal>,
    action: Option<ActionExpr>,
}

#[derive(Debug, Clone)]
struct RhsSpec {
    syms: Vec<Symbol<WordTerminal>>,
    action: Option<ActionExpr>,
}

/// Values flowing through the meta-grammar's attribute evaluation
#[derive(Debug, Clone, Default)]
enum SpecValue {
    #[default]
    Nil,
    Tok(SpecToken),
    Sym(Symbol<WordTerminal>),
    Syms(Vec<Symbol<WordTerminal>>),
    Action(ActionExpr),
    Rhs(RhsSpec),
    Alts(Vec<RhsSpec>),
    Prods(Vec<ProdSpec>),
}

fn shape_err(what: &str) -> EvalError {
    EvalError::new(format!("meta-grammar shape error: {}", what))
}

type MetaAction = ActionFn<SpecValue>;

/// The fixed meta-grammar that parses grammar specifications
fn meta_grammar(terminals: Arc<TerminalRegistry>) -> AttributeGrammar<SpecTerminal, SpecValue> {
    use SpecTokenKind::*;
    let nt = Symbol::<SpecTerminal>::nt;
    let tok = |k: SpecTokenKind| Symbol::Terminal(SpecTerminal::kind(k));
    let op = |v: &str| Symbol::Terminal(SpecTerminal::op(v));

    let concat_prods: MetaAction = Arc::new(|c: &[SpecValue]| match (&c[0], &c[1]) {
        (SpecValue::Prods(a), SpecValue::Prods(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(SpecValue::Prods(out))
        }
        _ => Err(shape_err("prodlist expects productions")),
    });

    let make_prod: MetaAction = Arc::new(|c: &[SpecValue]| {
        let lhs = match &c[0] {
            SpecValue::Tok(t) => t.value.clone(),
            _ => return Err(shape_err("production name")),
        };
        let alts = match c.last() {
            Some(SpecValue::Alts(alts)) => alts.clone(),
            _ => return Err(shape_err("production alternatives")),
        };
        Ok(SpecValue::Prods(
            alts.into_iter()
                .map(|rhs| ProdSpec {
                    production: Production::new(lhs.clone(), rhs.syms),
                    action: rhs.action,
                })
                .collect(),
        ))
    });

    let push_alt: MetaAction = Arc::new(|c: &[SpecValue]| {
        let mut alts = match &c[0] {
            SpecValue::Alts(a) => a.clone(),
            _ => return Err(shape_err("alternative list")),
        };
        match c.last() {
            Some(SpecValue::Rhs(rhs)) => alts.push(rhs.clone()),
            _ => return Err(shape_err("alternative")),
        }
        Ok(SpecValue::Alts(alts))
    });

    let single_alt: MetaAction = Arc::new(|c: &[SpecValue]| match &c[0] {
        SpecValue::Rhs(rhs) => Ok(SpecValue::Alts(vec![rhs.clone()])),
        _ => Err(shape_err("alternative")),
    });

    let rhs_with_action: MetaAction = Arc::new(|c: &[SpecValue]| match (&c[0], &c[1]) {
        (SpecValue::Syms(syms), SpecValue::Action(a)) => Ok(SpecValue::Rhs(RhsSpec {
            syms: syms.clone(),
            action: Some(a.clone()),
        })),
        _ => Err(shape_err("right-hand side")),
    });

    let rhs_plain: MetaAction = Arc::new(|c: &[SpecValue]| match &c[0] {
        SpecValue::Syms(syms) => Ok(SpecValue::Rhs(RhsSpec {
            syms: syms.clone(),
            action: None,
        })),
        _ => Err(shape_err("right-hand side")),
    });

    let push_sym: MetaAction = Arc::new(|c: &[SpecValue]| match (&c[0], &c[1]) {
        (SpecValue::Syms(syms), SpecValue::Sym(s)) => {
            let mut out = syms.clone();
            out.push(s.clone());
            Ok(SpecValue::Syms(out))
        }
        _ => Err(shape_err("symbol list")),
    });

    let single_sym: MetaAction = Arc::new(|c: &[SpecValue]| match &c[0] {
        SpecValue::Sym(s) => Ok(SpecValue::Syms(vec![s.clone()])),
        _ => Err(shape_err("symbol")),
    });

    let name_sym: MetaAction = Arc::new(|c: &[SpecValue]| match &c[0] {
        SpecValue::Tok(t) => Ok(SpecValue::Sym(Symbol::Nonterminal(t.value.clone()))),
        _ => Err(shape_err("nonterminal name")),
    });

    let string_sym: MetaAction = Arc::new(|c: &[SpecValue]| match &c[0] {
        SpecValue::Tok(t) => {
            let sym = if t.raw {
                WordTerminal::regexp(t.value.clone(), t.value.clone())
            } else if let Some(tag) = t.value.strip_prefix('/') {
                WordTerminal::pos(tag)
            } else {
                WordTerminal::literal(t.value.clone())
            };
            Ok(SpecValue::Sym(Symbol::Terminal(sym)))
        }
        _ => Err(shape_err("string symbol")),
    });

    let funcall_sym: MetaAction = {
        let terminals = Arc::clone(&terminals);
        Arc::new(move |c: &[SpecValue]| {
            let (name, args_text) = match (&c[0], &c[1]) {
                (SpecValue::Tok(name), SpecValue::Tok(args)) => {
                    (name.value.clone(), args.value.clone())
                }
                _ => return Err(shape_err("terminal constructor call")),
            };
            let args = parse_term_args(&args_text)
                .map_err(|e| EvalError::new(format!("bad arguments to {}: {}", name, e)))?;
            let ctor = terminals
                .get(&name)
                .ok_or_else(|| EvalError::new(format!("unknown terminal constructor: {}", name)))?;
            Ok(SpecValue::Sym(Symbol::Terminal(ctor(&args)?)))
        })
    };

    let compile_action: MetaAction = Arc::new(|c: &[SpecValue]| match &c[0] {
        SpecValue::Tok(t) => {
            let expr = ActionExpr::parse(&t.value)
                .map_err(|e| EvalError::new(format!("{}", e)))?;
            Ok(SpecValue::Action(expr))
        }
        _ => Err(shape_err("action body")),
    });

    let rules: Vec<(Production<SpecTerminal>, Option<MetaAction>)> = vec![
        (
            Production::new("grammar", vec![nt("prodlist"), tok(EndMarker)]),
            None,
        ),
        (
            Production::new(
                "prodlist",
                vec![nt("prodlist"), nt("prod"), tok(Newline)],
            ),
            Some(concat_prods),
        ),
        (
            Production::new("prodlist", vec![nt("prod"), tok(Newline)]),
            None,
        ),
        (
            Production::new(
                "prod",
                vec![tok(Name), op("-"), op(">"), nt("alt")],
            ),
            Some(make_prod),
        ),
        (
            Production::new("alt", vec![nt("alt"), op("|"), nt("rhs")]),
            Some(push_alt.clone()),
        ),
        (
            Production::new(
                "alt",
                vec![nt("alt"), tok(Newline), op("|"), nt("rhs")],
            ),
            Some(push_alt),
        ),
        (Production::new("alt", vec![nt("rhs")]), Some(single_alt)),
        (
            Production::new("rhs", vec![nt("symlist"), nt("action")]),
            Some(rhs_with_action),
        ),
        (
            Production::new("rhs", vec![nt("symlist")]),
            Some(rhs_plain),
        ),
        (
            Production::new("symlist", vec![nt("symlist"), nt("sym")]),
            Some(push_sym),
        ),
        (
            Production::new("symlist", vec![nt("sym")]),
            Some(single_sym),
        ),
        (Production::new("sym", vec![tok(Name)]), Some(name_sym)),
        (Production::new("sym", vec![tok(Str)]), Some(string_sym)),
        (
            Production::new("sym", vec![tok(Name), tok(Tuple)]),
            Some(funcall_sym),
        ),
        (
            Production::new("action", vec![tok(Expr)]),
            Some(compile_action),
        ),
    ];

    AttributeGrammar::new(rules, "grammar", |t: &SpecToken| SpecValue::Tok(t.clone()))
}

/// Parse the arguments of a terminal constructor call
fn parse_term_args(text: &str) -> Result<Vec<TermArg>, GrammarSpecError> {
    let toks = tokenize(text)?;
    let mut args = Vec::new();
    let mut pending_neg = false;
    for t in toks {
        match t.kind {
            SpecTokenKind::Str => {
                args.push(if t.raw {
                    TermArg::Raw(t.value)
                } else {
                    TermArg::Str(t.value)
                });
            }
            SpecTokenKind::Number => {
                let n: i64 = t.value.parse().map_err(|_| {
                    GrammarSpecError::Syntax(format!("bad integer argument: {}", t.value))
                })?;
                args.push(TermArg::Int(if pending_neg { -n } else { n }));
                pending_neg = false;
            }
            SpecTokenKind::Op if t.value == "," => {}
            SpecTokenKind::Op if t.value == "-" => pending_neg = true,
            SpecTokenKind::Newline | SpecTokenKind::EndMarker => {}
            _ => {
                return Err(GrammarSpecError::Syntax(format!(
                    "unexpected token in arguments: {:?}",
                    t.value
                )))
            }
        }
    }
    Ok(args)
}

/// Compile a grammar specification into an attribute grammar
///
/// `start` names the start symbol of the resulting grammar; `bindings`
/// supplies the terminal constructors and action vocabulary the file may
/// use. The result validates cleanly: every referenced nonterminal is
/// defined, and every [`WordTerminal::Other`] has been given the
/// grammar's literal table.
pub fn parse_grammar_spec(
    spec: &str,
    start: &str,
    bindings: &Bindings,
) -> Result<AttributeGrammar<WordTerminal, Value>, GrammarSpecError> {
    let toks = tokenize(spec)?;
    let meta = meta_grammar(Arc::clone(&bindings.terminals));
    let mut parser = Parser::new(meta.grammar());
    parser.parse(&toks).map_err(GrammarSpecError::Grammar)?;
    let tree = parser
        .parses()
        .into_iter()
        .next()
        .ok_or_else(|| GrammarSpecError::Syntax("no valid parse of the grammar file".into()))?;
    let prods = match meta.eval(&tree) {
        Ok(SpecValue::Prods(prods)) => prods,
        Ok(_) => {
            return Err(GrammarSpecError::Syntax(
                "grammar file did not evaluate to productions".into(),
            ))
        }
        Err(e) => {
            return Err(GrammarSpecError::InvalidAction(InvalidActionError {
                body: String::new(),
                message: e.message,
            }))
        }
    };

    // The Other terminal needs to know every literal word of the grammar.
    let mut literals: Vec<String> = prods
        .iter()
        .flat_map(|p| p.production.rhs.iter())
        .filter_map(|sym| match sym {
            Symbol::Terminal(WordTerminal::Literal(s)) => Some(s.clone()),
            _ => None,
        })
        .collect();
    literals.sort();
    literals.dedup();

    let rules: Vec<(Production<WordTerminal>, Option<ActionFn<Value>>)> = prods
        .into_iter()
        .map(|p| {
            let mut production = p.production;
            for sym in &mut production.rhs {
                if let Symbol::Terminal(WordTerminal::Other { words }) = sym {
                    if words.is_empty() {
                        *words = literals.clone();
                    }
                }
            }
            let action = p
                .action
                .map(|expr| expr.into_action(Arc::clone(&bindings.actions)));
            (production, action)
        })
        .collect();

    let grammar = AttributeGrammar::new(rules, start, |tok: &String| Value::Word(tok.clone()));
    grammar
        .grammar()
        .validate()
        .map_err(GrammarSpecError::Grammar)?;
    Ok(grammar)
}

thread_local! {
    static GRAMMAR_CACHE: RefCell<HashMap<u64, AttributeGrammar<WordTerminal, Value>>> =
        RefCell::new(HashMap::new());
}

fn spec_hash(spec: &str, start: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = ahash::AHasher::default();
    spec.hash(&mut hasher);
    start.hash(&mut hasher);
    hasher.finish()
}

/// Like [`parse_grammar_spec`], caching compiled grammars by source hash
///
/// Compiling a grammar file means running the Earley parser over it; the
/// cache makes repeated loads of the same file (the common case for the
/// built-in English grammar) free after the first.
pub fn parse_grammar_spec_cached(
    spec: &str,
    start: &str,
    bindings: &Bindings,
) -> Result<AttributeGrammar<WordTerminal, Value>, GrammarSpecError> {
    let key = spec_hash(spec, start);
    if let Some(found) = GRAMMAR_CACHE.with(|c| c.borrow().get(&key).cloned()) {
        return Ok(found);
    }
    let grammar = parse_grammar_spec(spec, start, bindings)?;
    GRAMMAR_CACHE.with(|c| c.borrow_mut().insert(key, grammar.clone()));
    Ok(grammar)
}
