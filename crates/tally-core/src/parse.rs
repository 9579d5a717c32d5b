//! # Order-Line Parser
//!
//! Extracts a `(quantity, name fragment)` pair from one line of freeform
//! operator text using an ordered cascade of surface patterns.
//!
//! ## The Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input line                    Pattern                     Result       │
//! │  ──────────────────────        ─────────────────────       ──────────   │
//! │  "3 Coca Cola"                 <int> <rest>                (3, name)    │
//! │  "2 cái Sprite"                <int> <unit> <rest>         (2, name)    │
//! │  "Coca Cola x5"                <rest> x <int>              (5, name)    │
//! │  "Bánh mì *2"                  <rest> * <int>              (2, name)    │
//! │  "Trà sữa +3"                  <rest> + <int>              (3, name)    │
//! │  "Sprite - 4 cái"              <rest> - <int> [unit]       (4, name)    │
//! │  "Sprite 4 cái"                <rest> <int> <unit>         (4, name)    │
//! │  "áo"                          (no match)                  (1, line)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order is a deliberate tie-break: some text is genuinely ambiguous
//! (e.g. a product name ending in a digit, "7-Up 2"), and the first matching
//! pattern wins. A bare trailing number with no marker is intentionally NOT a
//! quantity, so names ending in digits survive intact.
//!
//! ## Contract
//! Total function: always returns a result, never an error. Quantity is
//! always a positive integer; zero or unparseable counts coerce to 1. This
//! coercion is a recorded policy choice, not a defect.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::normalize::is_blank;

/// Unit counter words the cascade recognizes, with and without diacritics
/// ("cái"/"cai", "chiếc"/"chiec"). Kept as a regex fragment so every pattern
/// uses the identical alternation.
const UNIT_WORD: &str = r"(?:c[áa]i|chi[ếe]c)";

// Patterns are compiled once and applied in order; first match wins.
static RE_LEADING_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    // "<int> <rest>" and "<int> <unit> <rest>" share one pattern: an optional
    // unit word directly after the count is swallowed so "2 cái Sprite"
    // yields the fragment "Sprite", not "cái Sprite".
    Regex::new(&format!(r"(?i)^(\d+)\s+(?:{UNIT_WORD}\s+)?(\S.*)$")).expect("invalid regex")
});

static RE_TRAILING_X: LazyLock<Regex> = LazyLock::new(|| {
    // "x" needs either whitespace before it or digits glued after it,
    // otherwise names containing an interior x ("Mix 3") would be split.
    Regex::new(r"(?i)^(.+?)(?:\s+[x×]\s*|[x×])(\d+)$").expect("invalid regex")
});

static RE_TRAILING_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\*\s*(\d+)$").expect("invalid regex"));

static RE_TRAILING_PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\+\s*(\d+)$").expect("invalid regex"));

static RE_TRAILING_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(.+?)\s*[-–]\s*(\d+)(?:\s*{UNIT_WORD})?$"
    ))
    .expect("invalid regex")
});

static RE_TRAILING_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(.+?)\s+(\d+)\s*{UNIT_WORD}$")).expect("invalid regex")
});

// =============================================================================
// Parsed Line
// =============================================================================

/// The result of parsing one order line.
///
/// Ephemeral: produced per input line and consumed immediately by the
/// catalog resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// The raw line as typed (trimmed).
    pub original_text: String,

    /// Extracted quantity, always >= 1.
    pub quantity: i64,

    /// The non-quantity remainder of the line, prior to catalog resolution.
    pub name_fragment: String,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses one line of raw order text.
///
/// ## Example
/// ```rust
/// use tally_core::parse::parse_line;
///
/// let line = parse_line("Coca Cola x5");
/// assert_eq!(line.quantity, 5);
/// assert_eq!(line.name_fragment, "Coca Cola");
/// ```
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();

    let patterns: &[(&Regex, bool)] = &[
        // (regex, quantity_captured_first)
        (&RE_LEADING_COUNT, true),
        (&RE_TRAILING_X, false),
        (&RE_TRAILING_STAR, false),
        (&RE_TRAILING_PLUS, false),
        (&RE_TRAILING_DASH, false),
        (&RE_TRAILING_UNIT, false),
    ];

    for (re, qty_first) in patterns {
        if let Some(caps) = re.captures(line) {
            let (qty_str, name) = if *qty_first {
                (&caps[1], &caps[2])
            } else {
                (&caps[2], &caps[1])
            };
            return ParsedLine {
                original_text: line.to_string(),
                quantity: coerce_quantity(qty_str),
                name_fragment: name.trim().to_string(),
            };
        }
    }

    // No pattern matched: the whole line is the name, quantity defaults to 1.
    ParsedLine {
        original_text: line.to_string(),
        quantity: 1,
        name_fragment: line.to_string(),
    }
}

/// Splits multi-line input, discards blank lines, and parses each line.
///
/// Re-running this over the same text yields the same parsed lines, which is
/// what makes whole-text re-analysis idempotent at the cart level.
pub fn parse_text(text: &str) -> Vec<ParsedLine> {
    text.lines()
        .filter(|line| !is_blank(line))
        .map(parse_line)
        .collect()
}

/// Coerces a digit string into a positive quantity.
///
/// Unparseable (overflow) or zero counts become 1: the operator typed
/// *something* that looked like a count, and losing the line entirely would
/// be worse than defaulting it.
fn coerce_quantity(digits: &str) -> i64 {
    match digits.parse::<i64>() {
        Ok(n) if n >= 1 => n,
        _ => 1,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> (i64, String) {
        let p = parse_line(line);
        (p.quantity, p.name_fragment)
    }

    #[test]
    fn test_leading_count() {
        assert_eq!(parsed("3 Coca Cola"), (3, "Coca Cola".to_string()));
        assert_eq!(parsed("10 áo sơ mi"), (10, "áo sơ mi".to_string()));
    }

    #[test]
    fn test_leading_count_with_unit_word() {
        assert_eq!(parsed("2 cái Sprite"), (2, "Sprite".to_string()));
        assert_eq!(parsed("2 cai Sprite"), (2, "Sprite".to_string()));
        assert_eq!(parsed("3 chiếc áo"), (3, "áo".to_string()));
    }

    #[test]
    fn test_trailing_x() {
        assert_eq!(parsed("Coca Cola x5"), (5, "Coca Cola".to_string()));
        assert_eq!(parsed("Coca Cola X 5"), (5, "Coca Cola".to_string()));
        assert_eq!(parsed("Sprite ×2"), (2, "Sprite".to_string()));
    }

    #[test]
    fn test_trailing_star_and_plus() {
        assert_eq!(parsed("Bánh mì *2"), (2, "Bánh mì".to_string()));
        assert_eq!(parsed("Bánh mì * 2"), (2, "Bánh mì".to_string()));
        assert_eq!(parsed("Trà sữa +3"), (3, "Trà sữa".to_string()));
    }

    #[test]
    fn test_trailing_dash() {
        assert_eq!(parsed("Sprite - 4 cái"), (4, "Sprite".to_string()));
        assert_eq!(parsed("Sprite - 4"), (4, "Sprite".to_string()));
        assert_eq!(parsed("Sprite – 4 chiếc"), (4, "Sprite".to_string()));
    }

    #[test]
    fn test_trailing_unit_count() {
        assert_eq!(parsed("Sprite 4 cái"), (4, "Sprite".to_string()));
        assert_eq!(parsed("áo sơ mi 2 chiec"), (2, "áo sơ mi".to_string()));
    }

    #[test]
    fn test_fallback_whole_line() {
        assert_eq!(parsed("áo"), (1, "áo".to_string()));
        assert_eq!(parsed("Mix 3"), (1, "Mix 3".to_string())); // bare number is not a quantity
    }

    #[test]
    fn test_name_with_interior_x_survives() {
        // An interior x must not be mistaken for a multiplier marker.
        assert_eq!(parsed("Mix x3"), (3, "Mix".to_string()));
        assert_eq!(parsed("Maxi áo"), (1, "Maxi áo".to_string()));
    }

    #[test]
    fn test_name_ending_in_digit_survives() {
        // "7-Up 2" is ambiguous; the dash pattern is the documented tie-break.
        assert_eq!(parsed("7-Up - 2"), (2, "7-Up".to_string()));
        assert_eq!(parsed("333"), (1, "333".to_string()));
    }

    #[test]
    fn test_quantity_always_positive() {
        assert_eq!(parsed("0 Coca Cola").0, 1);
        // Overflow coerces to 1 rather than erroring
        assert_eq!(parsed("99999999999999999999 Coca Cola").0, 1);
        for line in ["3 Coca Cola", "x", "", "áo x0"] {
            assert!(parse_line(line).quantity >= 1);
        }
    }

    #[test]
    fn test_parse_text_discards_blank_lines() {
        let lines = parse_text("3 Coca Cola\n\n   \nSprite x2\n!!!\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[1].name_fragment, "Sprite");
    }

    #[test]
    fn test_name_non_empty_for_non_empty_input() {
        for line in ["3 Coca Cola", "áo", "Sprite x2", "a - 1", "9"] {
            assert!(!parse_line(line).name_fragment.is_empty());
        }
    }
}
