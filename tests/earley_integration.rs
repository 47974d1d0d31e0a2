//! Integration tests for the Earley parser driven by DSL-loaded grammars
//!
//! The grammars here come in through the grammar-spec pipeline, so these
//! tests exercise tokenizer, meta-grammar, action compilation, and chart
//! parsing together.

use std::sync::Arc;

use tempus::action::ActionRegistry;
use tempus::earley::Parser;
use tempus::error::EvalError;
use tempus::grammar_spec::{parse_grammar_spec, Bindings, TermArg, TerminalRegistry};
use tempus::terminals::WordTerminal;
use tempus::timex;
use tempus::value::Value;

fn toks(s: &str) -> Vec<String> {
    timex::tokens(s)
}

fn eval_first(
    grammar: &tempus::cfg::AttributeGrammar<WordTerminal, Value>,
    input: &[String],
) -> Option<Value> {
    let mut parser = Parser::new(grammar.grammar());
    parser.parse(input).ok()?;
    for tree in parser.parses() {
        if let Ok(v) = grammar.eval(&tree) {
            return Some(v);
        }
    }
    None
}

// ============================================================================
// Arithmetic expressions
// ============================================================================

fn arith_bindings() -> Bindings {
    let mut terminals = TerminalRegistry::new();
    terminals.register("Regexp", |args: &[TermArg]| {
        let pattern = args
            .first()
            .and_then(|a| a.as_str())
            .ok_or_else(|| EvalError::new("Regexp needs a pattern"))?;
        Ok(WordTerminal::regexp(pattern, pattern))
    });
    let mut actions = ActionRegistry::new();
    actions.register("int", |args: &[Value]| {
        args.first()
            .and_then(|v| v.as_word())
            .and_then(|w| w.parse::<i64>().ok())
            .map(Value::Int)
            .ok_or_else(|| EvalError::new("not a number"))
    });
    Bindings {
        terminals: Arc::new(terminals),
        actions: Arc::new(actions),
    }
}

#[test]
fn test_arithmetic_grammar() {
    let spec = r#"
P -> S
S -> S '+' M { _[0] + _[2] }
   | M
M -> M '*' T { _[0] * _[2] }
   | T
T -> Regexp(r"[0-9]+$", "number") { int(_[0]) }
"#;
    let grammar = parse_grammar_spec(spec, "P", &arith_bindings()).unwrap();
    let input: Vec<String> = ["2", "+", "3", "*", "4"].map(String::from).to_vec();
    assert_eq!(eval_first(&grammar, &input), Some(Value::Int(14)));
    let input: Vec<String> = ["20", "+", "5"].map(String::from).to_vec();
    assert_eq!(eval_first(&grammar, &input), Some(Value::Int(25)));
    let input: Vec<String> = ["17", "*", "2"].map(String::from).to_vec();
    assert_eq!(eval_first(&grammar, &input), Some(Value::Int(34)));
}

// ============================================================================
// English cardinals
// ============================================================================

fn number(phrase: &str) -> Option<i64> {
    let grammar = timex::number_grammar().unwrap();
    match eval_first(&grammar, &toks(phrase)) {
        Some(Value::Int(n)) => Some(n),
        _ => None,
    }
}

#[test]
fn test_small_numbers() {
    let words = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
        "eighteen", "nineteen", "twenty",
    ];
    for (i, w) in words.iter().enumerate() {
        assert_eq!(number(w), Some(i as i64), "word: {}", w);
    }
}

#[test]
fn test_compound_tens() {
    assert_eq!(number("twenty-one"), Some(21));
    assert_eq!(number("thirty-two"), Some(32));
    assert_eq!(number("ninety-eight"), Some(98));
}

#[test]
fn test_hundreds() {
    assert_eq!(number("one hundred"), Some(100));
    assert_eq!(number("one hundred ten"), Some(110));
    assert_eq!(number("one hundred and thirty-seven"), Some(137));
    assert_eq!(number("eight hundred eighty"), Some(880));
    assert_eq!(number("twelve hundred thirty-two"), Some(1232));
    assert_eq!(number("eighty-four hundred and twelve"), Some(8412));
}

#[test]
fn test_thousands() {
    assert_eq!(number("one thousand"), Some(1000));
    assert_eq!(number("two thousand and one"), Some(2001));
    assert_eq!(number("four thousand one hundred"), Some(4100));
    assert_eq!(number("six thousand two hundred sixty-eight"), Some(6268));
    assert_eq!(number("twelve thousand nine"), Some(12009));
    assert_eq!(
        number("four hundred thousand nine hundred and one"),
        Some(400_901)
    );
}

#[test]
fn test_year_pairs() {
    assert_eq!(number("nineteen ninety-nine"), Some(1999));
    assert_eq!(number("nineteen hundred ninety-nine"), Some(1999));
}

// ============================================================================
// Parser behavior through loaded grammars
// ============================================================================

#[test]
fn test_no_parse_is_not_an_error() {
    let grammar = timex::number_grammar().unwrap();
    let mut parser = Parser::new(grammar.grammar());
    parser.parse(&toks("entirely wordless")).unwrap();
    assert!(parser.parses().is_empty());
}

#[test]
fn test_chart_is_rebuilt_per_parse() {
    let grammar = timex::number_grammar().unwrap();
    let mut parser = Parser::new(grammar.grammar());
    parser.parse(&toks("seven")).unwrap();
    let first = parser.parses().len();
    parser.parse(&toks("eight")).unwrap();
    assert_eq!(parser.parses().len(), first);
    assert_eq!(parser.chart_len(), 2);
}
