//! Word terminals
//!
//! The terminal alphabet of the English timex grammar. Tokens are
//! lower-case word strings, optionally carrying a part-of-speech suffix
//! (`"monday/NN"`); terminals test a token's word form, except for
//! [`WordTerminal::Pos`], which tests the suffix.
//!
//! All variants are plain data — regexes are compiled on demand through
//! the thread-local cache — so terminals stay value-equal and hashable,
//! which the chart and the grammar index rely on.

use crate::cfg::TerminalMatcher;
use crate::error::GrammarError;
use crate::regex_cache;

/// Split a token into its word form and optional POS tag
fn word_form(token: &str) -> &str {
    match token.rsplit_once('/') {
        Some((word, _pos)) if !word.is_empty() => word,
        _ => token,
    }
}

fn pos_tag(token: &str) -> Option<&str> {
    token.rsplit_once('/').map(|(_, pos)| pos)
}

/// A terminal pattern over word tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WordTerminal {
    /// Case-folded exact match
    Literal(String),
    /// Anchored regex over the word form
    Regexp {
        /// The pattern, matched case-insensitively from the start
        pattern: String,
        /// Display name for diagnostics
        name: String,
    },
    /// An acronym, with or without dotted initials (`"a.d."` ~ `"ad"`)
    Acronym {
        /// The plain form, periods removed
        plain: String,
        /// The dotted form
        dotted: String,
    },
    /// A prefix abbreviation of a full word, optionally dot-terminated
    Abbrev {
        /// The full word
        full: String,
        /// Minimum prefix length that still counts
        min_len: usize,
    },
    /// A part-of-speech tag test
    Pos(String),
    /// A day of month, 1–31, with an optional ordinal suffix ("25th")
    DayOfMonth,
    /// A month number, 1–12
    MonthNumber,
    /// MM/DD or MM/DD/YY(YY)
    SlashDate,
    /// HH:MM or HH:MM:SS
    ClockTime,
    /// Any non-empty token
    Any,
    /// Any token that is none of the given literal words
    ///
    /// With an empty word list this matches nothing: the terminal is inert
    /// until the grammar loader supplies the literal table.
    Other {
        /// The grammar's literal words, sorted
        words: Vec<String>,
    },
}

impl WordTerminal {
    /// A case-folded literal
    pub fn literal(s: impl Into<String>) -> Self {
        WordTerminal::Literal(s.into().to_lowercase())
    }

    /// An anchored regex terminal
    pub fn regexp(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        WordTerminal::Regexp {
            pattern: pattern.into(),
            name: name.into(),
        }
    }

    /// An acronym terminal; the spec may be dotted or plain
    ///
    /// Rejects anything that is not a word or a dotted word.
    pub fn acronym(spec: impl Into<String>) -> Result<Self, GrammarError> {
        let spec = spec.into().to_lowercase();
        let dotted_re = regex_cache::get_or_compile(r"^(\w\.)+$")
            .ok_or_else(|| GrammarError::InvalidGrammarSpec("bad acronym pattern".into()))?;
        let plain_re = regex_cache::get_or_compile(r"^\w+$")
            .ok_or_else(|| GrammarError::InvalidGrammarSpec("bad acronym pattern".into()))?;
        if dotted_re.is_match(&spec) {
            let plain: String = spec.chars().filter(|c| *c != '.').collect();
            Ok(WordTerminal::Acronym { plain, dotted: spec })
        } else if plain_re.is_match(&spec) {
            let dotted: String = spec.chars().flat_map(|c| [c, '.']).collect();
            Ok(WordTerminal::Acronym { plain: spec, dotted })
        } else {
            Err(GrammarError::InvalidGrammarSpec(format!(
                "invalid acronym: {}",
                spec
            )))
        }
    }

    /// An abbreviation terminal; `min_len` must be positive
    pub fn abbrev(full: impl Into<String>, min_len: usize) -> Result<Self, GrammarError> {
        if min_len == 0 {
            return Err(GrammarError::InvalidGrammarSpec(
                "abbreviation needs a positive minimum length".into(),
            ));
        }
        Ok(WordTerminal::Abbrev {
            full: full.into().to_lowercase(),
            min_len,
        })
    }

    /// A part-of-speech terminal
    pub fn pos(tag: impl Into<String>) -> Self {
        WordTerminal::Pos(tag.into().to_lowercase())
    }

    fn regexp_captures<'t>(pattern: &str, text: &'t str) -> Option<regex::Captures<'t>> {
        let re = regex_cache::get_or_compile(pattern)?;
        re.captures(text)
    }
}

impl TerminalMatcher for WordTerminal {
    type Token = String;

    fn matches(&self, token: &String) -> bool {
        if token.is_empty() {
            return false;
        }
        let word = word_form(token).to_lowercase();
        match self {
            WordTerminal::Literal(lit) => !lit.is_empty() && word == *lit,
            WordTerminal::Regexp { pattern, .. } => {
                let anchored = format!("^(?:{})", pattern.trim_start_matches('^'));
                regex_cache::get_or_compile(&anchored)
                    .map_or(false, |re| re.is_match(&word))
            }
            WordTerminal::Acronym { plain, dotted } => word == *plain || word == *dotted,
            WordTerminal::Abbrev { full, min_len } => {
                let stripped = word.strip_suffix('.').unwrap_or(&word);
                stripped.len() >= *min_len && full.starts_with(stripped)
            }
            WordTerminal::Pos(tag) => {
                pos_tag(token).map_or(false, |p| p.eq_ignore_ascii_case(tag))
            }
            WordTerminal::DayOfMonth => {
                Self::regexp_captures(r"^([0-9]{1,2})(st|nd|rd|th)?$", &word)
                    .and_then(|c| c.get(1)?.as_str().parse::<u32>().ok())
                    .map_or(false, |d| (1..=31).contains(&d))
            }
            WordTerminal::MonthNumber => {
                Self::regexp_captures(r"^([0-9]{1,2})$", &word)
                    .and_then(|c| c.get(1)?.as_str().parse::<u32>().ok())
                    .map_or(false, |m| (1..=12).contains(&m))
            }
            WordTerminal::SlashDate => {
                Self::regexp_captures(
                    r"^([0-9]{1,2})/([0-9]{1,2})(?:/([0-9]{2}|[0-9]{4}))?$",
                    &word,
                )
                .map_or(false, |c| {
                    let m: u32 = c.get(1).and_then(|g| g.as_str().parse().ok()).unwrap_or(0);
                    let d: u32 = c.get(2).and_then(|g| g.as_str().parse().ok()).unwrap_or(0);
                    (1..=12).contains(&m) && (1..=31).contains(&d)
                })
            }
            WordTerminal::ClockTime => {
                Self::regexp_captures(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?$", &word)
                    .map_or(false, |c| {
                        let h: u32 =
                            c.get(1).and_then(|g| g.as_str().parse().ok()).unwrap_or(99);
                        let m: u32 =
                            c.get(2).and_then(|g| g.as_str().parse().ok()).unwrap_or(99);
                        let s: u32 = c
                            .get(3)
                            .and_then(|g| g.as_str().parse().ok())
                            .unwrap_or(0);
                        h <= 24 && m <= 59 && s <= 60
                    })
            }
            WordTerminal::Any => true,
            WordTerminal::Other { words } => {
                !words.is_empty() && words.binary_search(&word).is_err()
            }
        }
    }
}
