/// Normalize text for comparison: strip leading and trailing whitespace.
///
/// Interior whitespace is left alone. Apply to both sides of a comparison.
pub fn normalize(text: &str) -> &str {
    text.trim()
}

/// Compare program output with expected output
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}
