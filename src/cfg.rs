//! Context-free grammars
//!
//! Productions, grammars, attribute grammars, and parse trees, generic
//! over the terminal alphabet. A terminal is anything implementing
//! [`TerminalMatcher`]; the two alphabets in this crate are the word
//! terminals of the English grammar ([`crate::terminals::WordTerminal`])
//! and the lexical terminals of the grammar-spec DSL.
//!
//! Terminals are closed, value-equal enums rather than trait objects, so
//! productions are `Eq + Hash` and a chart can dedupe states by value.

use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, GrammarError};

/// A terminal pattern over some token type
pub trait TerminalMatcher: Clone + PartialEq + Eq + std::hash::Hash + fmt::Debug {
    /// The token type this terminal tests
    type Token: Clone + fmt::Debug;

    /// Whether the token matches this terminal
    fn matches(&self, token: &Self::Token) -> bool;
}

/// One element of a production's right-hand side
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol<T> {
    /// A nonterminal, referenced by name
    Nonterminal(String),
    /// A terminal pattern
    Terminal(T),
}

impl<T> Symbol<T> {
    /// Shorthand for a nonterminal symbol
    pub fn nt(name: impl Into<String>) -> Self {
        Symbol::Nonterminal(name.into())
    }
}

/// A production rule: one nonterminal expanding to a symbol sequence
///
/// Value-equal and hashable; instances are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production<T> {
    /// The left-hand-side nonterminal
    pub lhs: String,
    /// The right-hand-side symbols, possibly empty
    pub rhs: Vec<Symbol<T>>,
}

impl<T> Production<T> {
    /// Create a production
    pub fn new(lhs: impl Into<String>, rhs: Vec<Symbol<T>>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs,
        }
    }

    /// Number of right-hand-side symbols
    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// True for an empty production
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

impl<T: fmt::Debug> fmt::Display for Production<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for sym in &self.rhs {
            match sym {
                Symbol::Nonterminal(n) => write!(f, " {}", n)?,
                Symbol::Terminal(t) => write!(f, " {:?}", t)?,
            }
        }
        Ok(())
    }
}

/// A collection of productions with a designated start symbol
///
/// Productions are stored in declaration order and indexed by LHS;
/// declaration order is observable, since it decides the order in which
/// parses are enumerated.
#[derive(Debug, Clone)]
pub struct Grammar<T> {
    start: String,
    prods: Vec<Production<T>>,
    index: HashMap<String, Vec<usize>>,
}

impl<T: TerminalMatcher> Grammar<T> {
    /// Build a grammar from productions and a start symbol
    pub fn new(
        productions: impl IntoIterator<Item = Production<T>>,
        start: impl Into<String>,
    ) -> Self {
        let prods: Vec<Production<T>> = productions.into_iter().collect();
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, p) in prods.iter().enumerate() {
            index.entry(p.lhs.clone()).or_default().push(i);
        }
        Self {
            start: start.into(),
            prods,
            index,
        }
    }

    /// The start symbol
    pub fn start(&self) -> &str {
        &self.start
    }

    /// All productions in declaration order
    pub fn productions(&self) -> &[Production<T>] {
        &self.prods
    }

    /// The production with the given id
    pub fn production(&self, id: usize) -> &Production<T> {
        &self.prods[id]
    }

    /// Number of productions
    pub fn len(&self) -> usize {
        self.prods.len()
    }

    /// True when the grammar has no productions
    pub fn is_empty(&self) -> bool {
        self.prods.is_empty()
    }

    /// Production ids for a nonterminal, in declaration order
    pub fn rules(&self, lhs: &str) -> Result<&[usize], GrammarError> {
        self.index
            .get(lhs)
            .map(|v| v.as_slice())
            .ok_or_else(|| GrammarError::UnknownSymbol(lhs.to_string()))
    }

    /// Check that the start symbol and every referenced nonterminal exist
    pub fn validate(&self) -> Result<(), GrammarError> {
        self.rules(&self.start)?;
        for p in &self.prods {
            for sym in &p.rhs {
                if let Symbol::Nonterminal(n) = sym {
                    self.rules(n)?;
                }
            }
        }
        Ok(())
    }
}

/// A semantic action: children's values in, parent's value out
pub type ActionFn<V> = Arc<dyn Fn(&[V]) -> Result<V, EvalError> + Send + Sync>;

/// A grammar whose productions carry semantic actions
///
/// Terminal leaves enter evaluation through the `leaf` conversion; at each
/// internal node the production's action is applied to the children's
/// values in RHS order. The default action projects the first child.
pub struct AttributeGrammar<T: TerminalMatcher, V> {
    grammar: Grammar<T>,
    actions: Vec<Option<ActionFn<V>>>,
    leaf: fn(&T::Token) -> V,
}

impl<T: TerminalMatcher, V> Clone for AttributeGrammar<T, V> {
    fn clone(&self) -> Self {
        Self {
            grammar: self.grammar.clone(),
            actions: self.actions.clone(),
            leaf: self.leaf,
        }
    }
}

impl<T: TerminalMatcher, V> fmt::Debug for AttributeGrammar<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeGrammar")
            .field("start", &self.grammar.start)
            .field("productions", &self.grammar.prods.len())
            .finish()
    }
}

impl<T: TerminalMatcher, V: Clone + Default> AttributeGrammar<T, V> {
    /// Build from production/action pairs
    pub fn new(
        rules: impl IntoIterator<Item = (Production<T>, Option<ActionFn<V>>)>,
        start: impl Into<String>,
        leaf: fn(&T::Token) -> V,
    ) -> Self {
        let mut prods = Vec::new();
        let mut actions = Vec::new();
        for (p, a) in rules {
            prods.push(p);
            actions.push(a);
        }
        Self {
            grammar: Grammar::new(prods, start),
            actions,
            leaf,
        }
    }

    /// The underlying grammar
    pub fn grammar(&self) -> &Grammar<T> {
        &self.grammar
    }

    /// Evaluate a parse tree bottom-up
    pub fn eval(&self, tree: &ParseTree<T::Token>) -> Result<V, EvalError> {
        let mut children = Vec::with_capacity(tree.children.len());
        for child in &tree.children {
            children.push(match child {
                TreeNode::Leaf(tok) => (self.leaf)(tok),
                TreeNode::Node(sub) => self.eval(sub)?,
            });
        }
        match self.actions.get(tree.prod).and_then(|a| a.as_ref()) {
            Some(action) => action(&children),
            None => Ok(children.into_iter().next().unwrap_or_default()),
        }
    }
}

/// A node of a parse tree: a matched token or a subtree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode<Tok> {
    /// A token matched by a terminal
    Leaf(Tok),
    /// A completed sub-production
    Node(ParseTree<Tok>),
}

/// A parse tree over some grammar
///
/// Internal nodes carry the id of the production they complete; leaves
/// carry matched tokens. Structurally equal trees compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree<Tok> {
    /// Production id within the grammar this tree was parsed with
    pub prod: usize,
    /// Children in RHS order
    pub children: Vec<TreeNode<Tok>>,
}

impl<Tok> ParseTree<Tok> {
    /// The leaves of the tree, in order
    pub fn leaves(&self) -> Vec<&Tok> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Tok>) {
        for child in &self.children {
            match child {
                TreeNode::Leaf(tok) => out.push(tok),
                TreeNode::Node(sub) => sub.collect_leaves(out),
            }
        }
    }

    /// How many tokens this tree spans
    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                TreeNode::Leaf(_) => 1,
                TreeNode::Node(sub) => sub.leaf_count(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A case-folded literal over string tokens, for kernel tests
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Lit(&'static str);

    impl TerminalMatcher for Lit {
        type Token = String;
        fn matches(&self, token: &String) -> bool {
            !token.is_empty() && token.eq_ignore_ascii_case(self.0)
        }
    }

    fn ab_grammar() -> Grammar<Lit> {
        Grammar::new(
            vec![Production::new(
                "S",
                vec![Symbol::Terminal(Lit("a")), Symbol::Terminal(Lit("b"))],
            )],
            "S",
        )
    }

    #[test]
    fn test_production_equality() {
        let a = Production::new("S", vec![Symbol::<Lit>::nt("NP"), Symbol::nt("VP")]);
        let b = Production::new("S", vec![Symbol::<Lit>::nt("NP"), Symbol::nt("VP")]);
        assert_eq!(a, b);
        let c = Production::new("S", vec![Symbol::<Lit>::nt("NP")]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_grammar_index_preserves_order() {
        let g = Grammar::new(
            vec![
                Production::new("A", vec![Symbol::Terminal(Lit("x"))]),
                Production::new("B", vec![Symbol::Terminal(Lit("y"))]),
                Production::new("A", vec![Symbol::Terminal(Lit("z"))]),
            ],
            "A",
        );
        assert_eq!(g.rules("A").unwrap(), &[0, 2]);
        assert_eq!(g.rules("B").unwrap(), &[1]);
    }

    #[test]
    fn test_unknown_symbol() {
        let g = ab_grammar();
        assert!(matches!(
            g.rules("missing"),
            Err(GrammarError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_validate() {
        let g = ab_grammar();
        assert!(g.validate().is_ok());
        let bad: Grammar<Lit> = Grammar::new(
            vec![Production::new("S", vec![Symbol::nt("nowhere")])],
            "S",
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_eval_default_action_projects_first_child() {
        let ag: AttributeGrammar<Lit, i64> = AttributeGrammar::new(
            vec![(
                Production::new("S", vec![Symbol::Terminal(Lit("a"))]),
                None,
            )],
            "S",
            |_tok| 7,
        );
        let tree = ParseTree {
            prod: 0,
            children: vec![TreeNode::Leaf("a".to_string())],
        };
        assert_eq!(ag.eval(&tree).unwrap(), 7);
    }

    #[test]
    fn test_eval_applies_action() {
        let action: ActionFn<i64> = Arc::new(|children| Ok(children.iter().sum()));
        let ag: AttributeGrammar<Lit, i64> = AttributeGrammar::new(
            vec![(
                Production::new(
                    "S",
                    vec![Symbol::Terminal(Lit("a")), Symbol::Terminal(Lit("b"))],
                ),
                Some(action),
            )],
            "S",
            |tok| tok.len() as i64,
        );
        let tree = ParseTree {
            prod: 0,
            children: vec![
                TreeNode::Leaf("a".to_string()),
                TreeNode::Leaf("bb".to_string()),
            ],
        };
        assert_eq!(ag.eval(&tree).unwrap(), 3);
    }

    #[test]
    fn test_leaves_in_order() {
        let tree = ParseTree {
            prod: 0,
            children: vec![
                TreeNode::Leaf("x".to_string()),
                TreeNode::Node(ParseTree {
                    prod: 1,
                    children: vec![TreeNode::Leaf("y".to_string())],
                }),
                TreeNode::Leaf("z".to_string()),
            ],
        };
        assert_eq!(tree.leaves(), [&"x".to_string(), &"y".to_string(), &"z".to_string()]);
        assert_eq!(tree.leaf_count(), 3);
    }
}
