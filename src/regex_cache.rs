//! Thread-local cache of compiled regex patterns
//!
//! Terminal matchers and format-machine element ops compile their patterns
//! through this cache so that repeated matching never recompiles. Uses
//! thread-local storage for lock-free access; parsers are single-threaded
//! by design, so each thread simply warms its own cache.

use hashbrown::HashMap;
use regex::Regex;
use std::cell::RefCell;

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Get or compile a regex pattern
///
/// Returns `None` when the pattern is invalid. Invalid patterns are not
/// cached; every lookup of an invalid pattern recompiles and fails again,
/// which only happens with a malformed grammar file.
#[inline]
pub fn get_or_compile(pattern: &str) -> Option<Regex> {
    REGEX_CACHE.with(|cache| {
        if let Some(regex) = cache.borrow().get(pattern) {
            return Some(regex.clone());
        }
        match Regex::new(pattern) {
            Ok(regex) => {
                cache
                    .borrow_mut()
                    .insert(pattern.to_string(), regex.clone());
                Some(regex)
            }
            Err(_) => None,
        }
    })
}

/// Number of patterns cached on this thread
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}

/// Drop all cached patterns on this thread
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}
