//! The Earley parser
//!
//! A chart parser for arbitrary context-free grammars. A fresh pseudo-start
//! symbol guarantees the grammar's own symbols never collide with the
//! parser's bookkeeping. Each state set is driven to a fixed point with the
//! classic three rules; states are deduplicated by (rule, start, dot), and
//! alternative derivations of the same state are kept side by side so that
//! every parse of an ambiguous sentence can be enumerated.
//!
//! The parser never fails on unparseable input; it simply completes no
//! start state, and [`Parser::parses`] yields nothing. Enumeration runs
//! from the last state set backwards, so the longest prefix parses come
//! first — the timex driver leans on that order.

use hashbrown::HashMap;

use crate::cfg::{Grammar, ParseTree, Production, Symbol, TerminalMatcher, TreeNode};
use crate::error::GrammarError;

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

/// Production id of the synthetic start rule
const START_RULE: usize = usize::MAX;

/// How a state matched one RHS position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchRef {
    /// A scanned token, by input position
    Token(usize),
    /// A completed child state, by state id
    State(usize),
}

/// One way a state was reached from its dot-1 predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Derivation {
    prev: usize,
    last: MatchRef,
}

/// An Earley state: a dotted rule with a start position
///
/// States are interned per parse; `derivations` holds every distinct way
/// the portion before the dot was matched.
#[derive(Debug, Clone)]
struct State {
    prod: usize,
    start: usize,
    dot: usize,
    derivations: Vec<Derivation>,
}

/// An Earley parser over a grammar
///
/// The parser owns its chart and mutates it in place; it is not
/// reentrant. Share grammars freely, but give each thread its own parser.
///
/// # Example
///
/// ```
/// use tempus::cfg::{Grammar, Production, Symbol};
/// use tempus::earley::Parser;
/// use tempus::terminals::WordTerminal;
///
/// let grammar = Grammar::new(
///     vec![Production::new(
///         "S",
///         vec![
///             Symbol::Terminal(WordTerminal::literal("hello")),
///             Symbol::Terminal(WordTerminal::literal("world")),
///         ],
///     )],
///     "S",
/// );
/// let mut parser = Parser::new(&grammar);
/// parser.parse(&["hello".to_string(), "world".to_string()]).unwrap();
/// assert_eq!(parser.parses().len(), 1);
/// ```
pub struct Parser<'g, T: TerminalMatcher> {
    grammar: &'g Grammar<T>,
    synthetic: Production<T>,
    input: Vec<T::Token>,
    states: Vec<State>,
    chart: Vec<Vec<usize>>,
    seen: Vec<HashMap<(usize, usize, usize), usize>>,
}

impl<'g, T: TerminalMatcher> Parser<'g, T> {
    /// Create a parser for a grammar
    pub fn new(grammar: &'g Grammar<T>) -> Self {
        let synthetic = Production::new("$", vec![Symbol::nt(grammar.start())]);
        Self {
            grammar,
            synthetic,
            input: Vec::new(),
            states: Vec::new(),
            chart: Vec::new(),
            seen: Vec::new(),
        }
    }

    fn production(&self, id: usize) -> &Production<T> {
        if id == START_RULE {
            &self.synthetic
        } else {
            self.grammar.production(id)
        }
    }

    /// Number of state sets built by the last parse
    pub fn chart_len(&self) -> usize {
        self.chart.len()
    }

    fn ensure_set(&mut self, i: usize) {
        while self.chart.len() <= i {
            self.chart.push(Vec::new());
            self.seen.push(HashMap::new());
        }
    }

    /// Add a state, or a new derivation of an existing one
    ///
    /// Returns true when the chart changed.
    fn add_state(
        &mut self,
        set: usize,
        prod: usize,
        start: usize,
        dot: usize,
        derivation: Option<Derivation>,
    ) -> bool {
        self.ensure_set(set);
        let key = (prod, start, dot);
        if let Some(&sid) = self.seen[set].get(&key) {
            if let Some(d) = derivation {
                if !self.states[sid].derivations.contains(&d) {
                    self.states[sid].derivations.push(d);
                    return true;
                }
            }
            return false;
        }
        let sid = self.states.len();
        self.states.push(State {
            prod,
            start,
            dot,
            derivations: derivation.into_iter().collect(),
        });
        self.chart[set].push(sid);
        self.seen[set].insert(key, sid);
        true
    }

    /// Build the chart for an input sequence
    ///
    /// Fails only when the grammar references an undefined nonterminal;
    /// unparseable input is not an error.
    pub fn parse(&mut self, input: &[T::Token]) -> Result<(), GrammarError> {
        self.input = input.to_vec();
        self.states.clear();
        self.chart.clear();
        self.seen.clear();
        self.add_state(0, START_RULE, 0, 0, None);

        let n = self.input.len();
        for i in 0..=n {
            self.ensure_set(i);
            // Iterate the three rules to a fixed point on this state set.
            loop {
                let mut changed = false;
                let mut idx = 0;
                while idx < self.chart[i].len() {
                    let sid = self.chart[i][idx];
                    let (prod, start, dot) = {
                        let s = &self.states[sid];
                        (s.prod, s.start, s.dot)
                    };
                    let rule_len = self.production(prod).len();
                    if dot == rule_len {
                        changed |= self.complete(sid, prod, start, i);
                    } else {
                        let symbol = self.production(prod).rhs[dot].clone();
                        match symbol {
                            Symbol::Terminal(t) => {
                                if i < n && t.matches(&self.input[i]) {
                                    changed |= self.add_state(
                                        i + 1,
                                        prod,
                                        start,
                                        dot + 1,
                                        Some(Derivation {
                                            prev: sid,
                                            last: MatchRef::Token(i),
                                        }),
                                    );
                                }
                            }
                            Symbol::Nonterminal(nt) => {
                                for &rid in self.grammar.rules(&nt)? {
                                    changed |= self.add_state(i, rid, i, 0, None);
                                }
                            }
                        }
                    }
                    idx += 1;
                }
                if !changed {
                    break;
                }
            }
            log_debug!("state set {} holds {} states", i, self.chart[i].len());
        }
        Ok(())
    }

    /// The completer rule for one complete state
    fn complete(&mut self, sid: usize, prod: usize, start: usize, i: usize) -> bool {
        let mut changed = false;
        let lhs = self.production(prod).lhs.clone();
        self.ensure_set(start);
        let snapshot = self.chart[start].clone();
        for prev in snapshot {
            let (pp, ps, pd) = {
                let s = &self.states[prev];
                (s.prod, s.start, s.dot)
            };
            if pd >= self.production(pp).len() {
                continue;
            }
            if let Symbol::Nonterminal(next) = &self.production(pp).rhs[pd] {
                if *next == lhs {
                    changed |= self.add_state(
                        i,
                        pp,
                        ps,
                        pd + 1,
                        Some(Derivation {
                            prev,
                            last: MatchRef::State(sid),
                        }),
                    );
                }
            }
        }
        changed
    }

    /// Enumerate completed parse trees, longest prefix first
    ///
    /// A completed parse is a complete synthetic-start state beginning at
    /// position 0; its single child is the tree over the real start
    /// symbol. Sets are visited from the last backwards, so a parse that
    /// consumed more input comes before a shorter one; within one set,
    /// trees come out in production declaration order.
    pub fn parses(&self) -> Vec<ParseTree<T::Token>> {
        let mut out = Vec::new();
        for i in (0..self.chart.len()).rev() {
            for &sid in &self.chart[i] {
                let s = &self.states[sid];
                if s.prod == START_RULE && s.start == 0 && s.dot == self.synthetic.len() {
                    for d in &s.derivations {
                        if let MatchRef::State(child) = d.last {
                            out.extend(self.trees(child));
                        }
                    }
                }
            }
        }
        out
    }

    /// All parse trees rooted at one complete state
    fn trees(&self, sid: usize) -> Vec<ParseTree<T::Token>> {
        let state = &self.states[sid];
        let mut result = Vec::new();
        for matched in self.match_sequences(sid) {
            // Cartesian product over the alternatives of each child.
            let mut partial: Vec<Vec<TreeNode<T::Token>>> = vec![Vec::new()];
            for m in &matched {
                let options: Vec<TreeNode<T::Token>> = match m {
                    MatchRef::Token(pos) => {
                        vec![TreeNode::Leaf(self.input[*pos].clone())]
                    }
                    MatchRef::State(child) => self
                        .trees(*child)
                        .into_iter()
                        .map(TreeNode::Node)
                        .collect(),
                };
                let mut next = Vec::with_capacity(partial.len() * options.len());
                for p in &partial {
                    for o in &options {
                        let mut row = p.clone();
                        row.push(o.clone());
                        next.push(row);
                    }
                }
                partial = next;
            }
            for children in partial {
                result.push(ParseTree {
                    prod: state.prod,
                    children,
                });
            }
        }
        result
    }

    /// Every distinct matched sequence leading to a state
    fn match_sequences(&self, sid: usize) -> Vec<Vec<MatchRef>> {
        let state = &self.states[sid];
        if state.dot == 0 {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        for d in &state.derivations {
            for mut seq in self.match_sequences(d.prev) {
                seq.push(d.last);
                out.push(seq);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminals::WordTerminal;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn lit(s: &str) -> Symbol<WordTerminal> {
        Symbol::Terminal(WordTerminal::literal(s))
    }

    fn ab_grammar() -> Grammar<WordTerminal> {
        Grammar::new(
            vec![Production::new("S", vec![lit("a"), lit("b")])],
            "S",
        )
    }

    #[test]
    fn test_accept() {
        let g = ab_grammar();
        let mut p = Parser::new(&g);
        p.parse(&toks("a b")).unwrap();
        assert_eq!(p.chart_len(), 3);
        let parses = p.parses();
        assert_eq!(
            parses,
            vec![ParseTree {
                prod: 0,
                children: vec![
                    TreeNode::Leaf("a".to_string()),
                    TreeNode::Leaf("b".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn test_reject() {
        let g = ab_grammar();
        let mut p = Parser::new(&g);
        p.parse(&toks("a a")).unwrap();
        assert!(p.parses().is_empty());
    }

    #[test]
    fn test_unknown_symbol_surfaces() {
        let g: Grammar<WordTerminal> =
            Grammar::new(vec![Production::new("S", vec![Symbol::nt("ghost")])], "S");
        let mut p = Parser::new(&g);
        assert!(p.parse(&toks("a")).is_err());
    }

    /// The PP-attachment grammar from the classic ambiguity example.
    fn attachment_grammar() -> Grammar<WordTerminal> {
        Grammar::new(
            vec![
                Production::new("S", vec![Symbol::nt("NP"), Symbol::nt("VP")]),
                Production::new("NP", vec![Symbol::nt("NP"), Symbol::nt("PP")]),
                Production::new("NP", vec![lit("john")]),
                Production::new("NP", vec![lit("sue")]),
                Production::new("NP", vec![lit("denver")]),
                Production::new("VP", vec![Symbol::nt("V"), Symbol::nt("NP")]),
                Production::new("VP", vec![Symbol::nt("VP"), Symbol::nt("PP")]),
                Production::new("V", vec![lit("called")]),
                Production::new("PP", vec![Symbol::nt("P"), Symbol::nt("NP")]),
                Production::new("P", vec![lit("from")]),
            ],
            "S",
        )
    }

    #[test]
    fn test_unambiguous_sentence() {
        let g = attachment_grammar();
        let mut p = Parser::new(&g);
        p.parse(&toks("john called sue")).unwrap();
        assert_eq!(p.parses().len(), 1);
    }

    #[test]
    fn test_ambiguous_sentence_has_three_parses() {
        let g = attachment_grammar();
        let mut p = Parser::new(&g);
        p.parse(&toks("john called sue from denver")).unwrap();
        // Two attachments of the PP over the whole sentence, plus the
        // three-token prefix parse.
        let parses = p.parses();
        assert_eq!(parses.len(), 3);
        assert_eq!(parses.iter().filter(|t| t.leaf_count() == 5).count(), 2);
        assert_eq!(parses.iter().filter(|t| t.leaf_count() == 3).count(), 1);
    }

    #[test]
    fn test_no_parse() {
        let g = attachment_grammar();
        let mut p = Parser::new(&g);
        p.parse(&toks("john sue")).unwrap();
        assert!(p.parses().is_empty());
    }

    #[test]
    fn test_empty_production() {
        // A -> ε | "a" A accepts any finite run of "a".
        let g: Grammar<WordTerminal> = Grammar::new(
            vec![
                Production::new("A", vec![]),
                Production::new("A", vec![lit("a"), Symbol::nt("A")]),
            ],
            "A",
        );
        for n in 0..5 {
            let input: Vec<String> = std::iter::repeat("a".to_string()).take(n).collect();
            let mut p = Parser::new(&g);
            p.parse(&input).unwrap();
            assert!(
                p.parses().iter().any(|t| t.leaf_count() == n),
                "should accept {} a's",
                n
            );
        }
    }

    #[test]
    fn test_longest_prefix_first() {
        let g = attachment_grammar();
        let mut p = Parser::new(&g);
        p.parse(&toks("john called sue from denver")).unwrap();
        let parses = p.parses();
        assert!(!parses.is_empty());
        // The five-token parses come before the three-token prefix parse.
        assert_eq!(parses[0].leaf_count(), 5);
        assert!(parses.iter().any(|t| t.leaf_count() == 3));
    }
}
