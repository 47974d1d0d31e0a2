//! Parse English sentences from the command line into temporal terms.
//!
//! Run with: cargo run --example parse-sentence -- "two weeks ago"

use tempus::timex::{parse, timex_grammar, tokens, Term};

fn main() {
    let sentence = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let sentence = if sentence.is_empty() {
        "October 25 is the first Sunday of the month".to_string()
    } else {
        sentence
    };

    let grammar = match timex_grammar() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to load the timex grammar: {}", e);
            std::process::exit(1);
        }
    };

    println!("input: {:?}", sentence);
    for term in parse(&tokens(&sentence), &grammar) {
        match &term {
            Term::Word(w) => println!("  word      {:?}", w),
            Term::Number(n) => println!("  number    {}", n),
            Term::Unit(u) => println!("  unit      {}({})", u.kind(), u),
            Term::Rep(r) => println!("  rep       {:?}", r),
            Term::Function(f) => println!("  function  {:?}", f),
        }
    }
}
