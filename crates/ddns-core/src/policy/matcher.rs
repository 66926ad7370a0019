//! Domain pattern matching for ignore rules

use crate::error::{Error, Result};
use regex::Regex;

/// Test `target` against the regular expression `pattern`
///
/// The match is unanchored: `"example"` matches `"www.example.com"`. Anchor
/// the pattern (`^...$`) to require a full-name match.
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] if `pattern` does not compile.
pub fn match_pattern(pattern: &str, target: &str) -> Result<bool> {
    let re = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;
    Ok(re.is_match(target))
}
