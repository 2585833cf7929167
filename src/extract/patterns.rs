//! Line classifiers for question headers, answer lines, and option markers

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADER: Regex = Regex::new(r"(?i)^(?:Question\s+\d+|Q\.?\s*\d+)").unwrap();
    static ref ANSWER: Regex =
        Regex::new(r"(?i)^(?:Correct Answer|Answer|Correct)\s*[:.]?\s*([A-F, ]+)").unwrap();
    static ref OPTION: Regex = Regex::new(r"^[A-F]\.").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
}

/// Normalized question id if `line` starts with a question header.
///
/// `"Question 12"` becomes `"QUESTION 12"`, `"q.7"` becomes `"Q.7"`.
pub fn match_header(line: &str) -> Option<String> {
    HEADER
        .find(line)
        .map(|m| WHITESPACE.replace_all(m.as_str(), " ").to_uppercase())
}

/// Raw answer letters if `line` is an answer line (`"Answer: B, D"` gives `"B, D"`).
///
/// A match whose letters trim to nothing still counts as an answer line and
/// yields an empty string.
pub fn match_answer(line: &str) -> Option<String> {
    ANSWER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Whether `line` starts with an `A.` .. `F.` option marker
pub fn is_option(line: &str) -> bool {
    OPTION.is_match(line)
}

/// Numeric sort key of a question id: its first run of digits, 0 when none
pub fn numeric_key(id: &str) -> u32 {
    DIGITS
        .find(id)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
