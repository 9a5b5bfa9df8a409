//! Name sanitization and collision avoidance.
//!
//! Clipboard text copied out of a binary (URL paths, handler names, file names)
//! rarely makes a legal symbol on its own. `sanitize_with` rewrites a known
//! file-style suffix into an uppercase token and replaces the characters hosts
//! reject; `disambiguate` then finds the first free `name`, `name_1`, `name_2`, ...
//!
//! Everything here is pure so it can be reused by any host.

use serde::{Deserialize, Serialize};

/// Characters replaced with `_` during sanitization.
pub const INVALID_NAME_CHARS: [char; 3] = ['.', '/', '?'];

/// One suffix remapping rule, e.g. `.cgi` -> `CGI`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    /// Suffix matched case-insensitively at the end of the name.
    pub suffix: String,
    /// Replacement token appended in place of the suffix.
    pub token: String,
}

impl SuffixRule {
    pub fn new(suffix: impl Into<String>, token: impl Into<String>) -> Self {
        Self { suffix: suffix.into(), token: token.into() }
    }

    /// Apply this rule to `name`, returning the rewritten name on a match.
    fn apply(&self, name: &str) -> Option<String> {
        let suffix_chars = self.suffix.chars().count();
        let name_chars = name.chars().count();
        if suffix_chars == 0 || suffix_chars > name_chars {
            return None;
        }

        // Split on a char boundary so non-ASCII names never panic.
        let split = name.char_indices().nth(name_chars - suffix_chars).map(|(idx, _)| idx)?;
        let (head, tail) = name.split_at(split);
        if tail.to_lowercase() == self.suffix.to_lowercase() {
            Some(format!("{head}{}", self.token))
        } else {
            None
        }
    }
}

/// Ordered list of suffix rules. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuffixMap {
    rules: Vec<SuffixRule>,
}

impl SuffixMap {
    pub fn new(rules: Vec<SuffixRule>) -> Self {
        Self { rules }
    }

    /// A map with no rules; only character replacement applies.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[SuffixRule] {
        &self.rules
    }

    /// Rewrite the first matching suffix, or return `name` unchanged.
    pub fn apply(&self, name: &str) -> String {
        self.rules.iter().find_map(|rule| rule.apply(name)).unwrap_or_else(|| name.to_string())
    }
}

impl Default for SuffixMap {
    fn default() -> Self {
        Self::new(vec![
            SuffixRule::new(".cgi", "CGI"),
            SuffixRule::new(".htm", "HTM"),
            SuffixRule::new(".asp", "ASP"),
            SuffixRule::new(".html", "HTML"),
        ])
    }
}

/// Sanitize `name` with the default suffix map.
pub fn sanitize(name: &str) -> String {
    sanitize_with(name, &SuffixMap::default())
}

/// Remap a trailing suffix via `suffixes`, then replace `.`, `/` and `?` with `_`.
pub fn sanitize_with(name: &str, suffixes: &SuffixMap) -> String {
    suffixes
        .apply(name)
        .chars()
        .map(|c| if INVALID_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Return `name` if it is free, otherwise the first free `name_N` for N = 1, 2, ...
pub fn disambiguate<F>(name: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    match try_disambiguate(name, |candidate| Ok::<_, std::convert::Infallible>(exists(candidate))) {
        Ok(found) => found,
        Err(never) => match never {},
    }
}

/// Fallible form of [`disambiguate`]; the first probe error aborts the search.
pub fn try_disambiguate<F, E>(name: &str, mut exists: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    if !exists(name)? {
        return Ok(name.to_string());
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Whether a host should accept `name` as a symbol.
///
/// Hosts differ in what they allow; this is the common floor: non-empty, no
/// whitespace or control characters.
pub fn is_valid_symbol_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}
