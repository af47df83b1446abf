//! Text canonicalization applied before similarity comparison.
//!
//! OCR output and labels for the same page routinely differ in whitespace,
//! stray symbols, and letter case without differing in content. Both sides of
//! every comparison therefore pass through one fixed pipeline:
//!
//! 1. map circled choice glyphs ①–⑤ to ASCII digits
//! 2. strip characters outside the allow-list (Latin letters, Hangul
//!    syllables and Jamo, digits, whitespace, and `+-*/=^(){}<>#?!.`), which
//!    keeps inline mathematical expressions intact
//! 3. drop tab and newline characters
//! 4. collapse runs of spaces and trim
//! 5. lowercase
//!
//! Null and the empty string canonicalize to [`Normalized::Absent`]; booleans
//! pass through untouched (they are judged by equality, never by text
//! metrics); numbers are rendered to their decimal string form first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Characters that survive canonicalization. Everything else is stripped.
static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z가-힣ㄱ-ㅎ0-9\s+\-*/=^(){}<>#?!.]").expect("valid allow-list pattern")
});

static TABS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\t\n]+").expect("valid whitespace pattern"));

/// A canonicalized scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// JSON null or an empty string: absent for comparison purposes.
    /// Distinct from text that merely *canonicalizes* to nothing.
    Absent,
    /// Boolean, passed through unchanged.
    Bool(bool),
    /// Canonical text form.
    Text(String),
}

impl Normalized {
    /// Canonicalize a scalar JSON value.
    ///
    /// Returns `None` for arrays and objects: compound values are dispatched
    /// element-wise (or skipped) by the caller, never canonicalized whole.
    ///
    /// # Examples
    ///
    /// ```
    /// use fideval::Normalized;
    /// use serde_json::json;
    ///
    /// assert_eq!(Normalized::from_value(&json!("")), Some(Normalized::Absent));
    /// assert_eq!(Normalized::from_value(&json!(true)), Some(Normalized::Bool(true)));
    /// assert_eq!(
    ///     Normalized::from_value(&json!("①②③ $x+y$ !!")),
    ///     Some(Normalized::Text("123 x+y !!".to_string()))
    /// );
    /// assert_eq!(Normalized::from_value(&json!([1, 2])), None);
    /// ```
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Normalized> {
        match value {
            Value::Null => Some(Normalized::Absent),
            Value::Bool(b) => Some(Normalized::Bool(*b)),
            Value::Number(n) => Some(Normalized::Text(canonicalize(&n.to_string()))),
            Value::String(s) if s.is_empty() => Some(Normalized::Absent),
            Value::String(s) => Some(Normalized::Text(canonicalize(s))),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The canonical text, if this value carries any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Normalized::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Run the five-step canonicalization pipeline over raw text.
#[must_use]
pub fn canonicalize(input: &str) -> String {
    let converted = convert_choice_glyphs(input);
    let stripped = DISALLOWED.replace_all(&converted, "");
    let flat = TABS_NEWLINES.replace_all(&stripped, "");
    let collapsed = flat.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Map circled choice glyphs ①–⑤ to their ASCII digit.
fn convert_choice_glyphs(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '①' => '1',
            '②' => '2',
            '③' => '3',
            '④' => '4',
            '⑤' => '5',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_empty_are_absent() {
        assert_eq!(Normalized::from_value(&json!(null)), Some(Normalized::Absent));
        assert_eq!(Normalized::from_value(&json!("")), Some(Normalized::Absent));
    }

    #[test]
    fn test_bool_passes_through() {
        assert_eq!(
            Normalized::from_value(&json!(false)),
            Some(Normalized::Bool(false))
        );
    }

    #[test]
    fn test_numbers_stringify() {
        assert_eq!(
            Normalized::from_value(&json!(3)),
            Some(Normalized::Text("3".to_string()))
        );
        assert_eq!(
            Normalized::from_value(&json!(2.5)),
            Some(Normalized::Text("2.5".to_string()))
        );
    }

    #[test]
    fn test_choice_glyphs_mapped() {
        assert_eq!(canonicalize("①②③④⑤"), "12345");
    }

    #[test]
    fn test_math_expression_preserved() {
        // Stray symbols go, the inline expression survives.
        assert_eq!(canonicalize("①②③ $x+y$ !!"), "123 x+y !!");
        assert_eq!(canonicalize("f(x) = x^2 + 1"), "f(x) = x^2 + 1");
    }

    #[test]
    fn test_whitespace_collapsed() {
        // Tabs and newlines are removed outright (joining their neighbors),
        // then space runs collapse to one.
        assert_eq!(canonicalize("  a\t\tb\n\nc   d  "), "abc d");
        assert_eq!(canonicalize("one  two   three"), "one two three");
    }

    #[test]
    fn test_lowercased() {
        assert_eq!(canonicalize("Hello WORLD"), "hello world");
    }

    #[test]
    fn test_hangul_preserved() {
        assert_eq!(canonicalize("정답은 ③번"), "정답은 3번");
    }

    #[test]
    fn test_stripped_to_nothing_is_still_text() {
        // "" input is Absent; text that cleans down to nothing is not.
        assert_eq!(
            Normalized::from_value(&json!("@@@")),
            Some(Normalized::Text(String::new()))
        );
    }

    #[test]
    fn test_compound_values_are_not_scalars() {
        assert_eq!(Normalized::from_value(&json!({"a": 1})), None);
        assert_eq!(Normalized::from_value(&json!(["a"])), None);
    }
}
