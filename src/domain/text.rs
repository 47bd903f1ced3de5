// src/domain/text.rs

/// Lowercased alphanumeric slug, runs of anything else collapsed to `_`.
/// "Doodle Rock Rescue" -> "doodle_rock_rescue"
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Splits lowercased text into alphanumeric words.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// A single-word pattern must match a whole word ("no" must not match
/// "unknown"); anything with spaces or punctuation is a substring match.
pub fn matches(lowered: &str, pattern: &str) -> bool {
    if pattern.chars().all(char::is_alphanumeric) {
        words(lowered).any(|w| w == pattern)
    } else {
        lowered.contains(pattern)
    }
}

/// Walks an ordered rule list and returns the first value whose patterns hit.
pub fn first_rule<T: Copy>(text: &str, rules: &[(&[&str], T)]) -> Option<T> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    rules
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| matches(&lowered, p)))
        .map(|(_, value)| *value)
}

/// Trims and collapses inner whitespace; `None` when nothing is left.
pub fn clean(text: Option<&str>) -> Option<String> {
    let joined = text?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}
