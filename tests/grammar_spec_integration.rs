//! Integration tests for the grammar-spec pipeline
//!
//! Loading grammar files end to end: the DSL surface, the registries, the
//! error taxonomy, and a custom grammar built against the standard timex
//! vocabulary.

use tempus::earley::Parser;
use tempus::error::GrammarSpecError;
use tempus::grammar_spec::{parse_grammar_spec, Bindings};
use tempus::timex;
use tempus::value::Value;

fn accepts(spec: &str, start: &str, bindings: &Bindings, input: &[&str]) -> bool {
    let grammar = match parse_grammar_spec(spec, start, bindings) {
        Ok(g) => g,
        Err(_) => return false,
    };
    let toks: Vec<String> = input.iter().map(|s| s.to_string()).collect();
    let mut parser = Parser::new(grammar.grammar());
    if parser.parse(&toks).is_err() {
        return false;
    }
    parser.parses().iter().any(|t| t.leaf_count() == toks.len())
}

// ============================================================================
// DSL surface
// ============================================================================

#[test]
fn test_literals_and_alternatives() {
    let spec = "greeting -> \"hello\" \"world\"\n    | \"hi\"\n";
    let b = Bindings::empty();
    assert!(accepts(spec, "greeting", &b, &["hello", "world"]));
    assert!(accepts(spec, "greeting", &b, &["hi"]));
    assert!(!accepts(spec, "greeting", &b, &["world", "hello"]));
}

#[test]
fn test_literals_fold_case() {
    let spec = "x -> \"Hello\"\n";
    assert!(accepts(spec, "x", &Bindings::empty(), &["hello"]));
}

#[test]
fn test_regex_terminal() {
    let spec = "num -> r\"[0-9]+$\"\n";
    let b = timex::bindings();
    assert!(accepts(spec, "num", &b, &["123"]));
    assert!(!accepts(spec, "num", &b, &["12x"]));
}

#[test]
fn test_pos_terminal() {
    let spec = "noun -> \"/NN\"\n";
    let b = Bindings::empty();
    assert!(accepts(spec, "noun", &b, &["dog/NN"]));
    assert!(!accepts(spec, "noun", &b, &["runs/VB"]));
}

#[test]
fn test_terminal_constructors() {
    let spec = "x -> Abbrev(\"january\", 3) Acronym(\"ad\") DayOfMonth()\n";
    let b = timex::bindings();
    assert!(accepts(spec, "x", &b, &["jan.", "a.d.", "25th"]));
    assert!(accepts(spec, "x", &b, &["january", "ad", "3"]));
    assert!(!accepts(spec, "x", &b, &["ja", "ad", "3"]));
}

#[test]
fn test_recursive_rules() {
    let spec = "list -> item\n    | list item\nitem -> \"x\"\n";
    let b = Bindings::empty();
    assert!(accepts(spec, "list", &b, &["x"]));
    assert!(accepts(spec, "list", &b, &["x", "x", "x", "x"]));
}

// ============================================================================
// Error taxonomy
// ============================================================================

#[test]
fn test_token_error() {
    let spec = "x -> \"a\" { _[0\n";
    assert!(matches!(
        parse_grammar_spec(spec, "x", &Bindings::empty()),
        Err(GrammarSpecError::Token(_))
    ));
}

#[test]
fn test_invalid_action_error() {
    let spec = "x -> \"a\" {   }\n";
    assert!(matches!(
        parse_grammar_spec(spec, "x", &Bindings::empty()),
        Err(GrammarSpecError::InvalidAction(_))
    ));
}

#[test]
fn test_syntax_error() {
    // An arrow with no right-hand side never parses.
    let spec = "x ->\n";
    assert!(matches!(
        parse_grammar_spec(spec, "x", &Bindings::empty()),
        Err(GrammarSpecError::Syntax(_))
    ));
}

#[test]
fn test_undefined_symbol_error() {
    let spec = "x -> ghost\n";
    assert!(matches!(
        parse_grammar_spec(spec, "x", &Bindings::empty()),
        Err(GrammarSpecError::Grammar(_))
    ));
}

#[test]
fn test_unknown_start_symbol() {
    let spec = "x -> \"a\"\n";
    assert!(matches!(
        parse_grammar_spec(spec, "nowhere", &Bindings::empty()),
        Err(GrammarSpecError::Grammar(_))
    ));
}

#[test]
fn test_unknown_constructor() {
    let spec = "x -> Imaginary()\n";
    assert!(parse_grammar_spec(spec, "x", &Bindings::empty()).is_err());
}

// ============================================================================
// Custom grammars over the standard vocabulary
// ============================================================================

#[test]
fn test_custom_grammar_with_timex_actions() {
    // A caller-supplied grammar can reuse the standard vocabulary.
    let spec = "when -> \"on\" day { _[1] }\nday -> DayOfMonth() { day_of_month(_[0]) }\n";
    let grammar = parse_grammar_spec(spec, "when", &timex::bindings()).unwrap();
    let toks: Vec<String> = ["on", "25th"].map(String::from).to_vec();
    let mut parser = Parser::new(grammar.grammar());
    parser.parse(&toks).unwrap();
    let tree = parser.parses().into_iter().next().unwrap();
    match grammar.eval(&tree).unwrap() {
        Value::Unit(u) => assert_eq!(u.value(), 25),
        other => panic!("unexpected value: {:?}", other),
    }
}

#[test]
fn test_splice_action() {
    use tempus::timex::{parse, Term};
    // A rule may recognize a range but surface its pieces separately.
    let spec = "range -> day \"to\" day { splice(_[0], \"to\", _[2]) }\nday -> DayOfMonth() { day_of_month(_[0]) }\n";
    let grammar = parse_grammar_spec(spec, "range", &timex::bindings()).unwrap();
    let toks: Vec<String> = ["12", "to", "25"].map(String::from).to_vec();
    let out: Vec<Term> = parse(&toks, &grammar).collect();
    assert_eq!(out.len(), 3);
    assert!(matches!(out[0], Term::Unit(_)));
    assert_eq!(out[1], Term::Word("to".into()));
    assert!(matches!(out[2], Term::Unit(_)));
}
