//! # Text Normalization
//!
//! Deterministic folding applied before any comparison between operator text
//! and catalog names/aliases.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "  Áo Sơ-Mi   TRẮNG!! "                                                │
//! │       │  fold diacritics (deunicode)                                    │
//! │       ▼                                                                 │
//! │  "  Ao So-Mi   TRANG!! "                                                │
//! │       │  lowercase                                                      │
//! │       ▼                                                                 │
//! │  "  ao so-mi   trang!! "                                                │
//! │       │  non-alphanumeric → space                                       │
//! │       ▼                                                                 │
//! │  "  ao so mi   trang   "                                                │
//! │       │  collapse whitespace + trim                                     │
//! │       ▼                                                                 │
//! │  "ao so mi trang"                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same function is used for catalog names, aliases, and query fragments
//! so comparisons are symmetric. It is pure, total (never fails), and
//! idempotent: `normalize(normalize(x)) == normalize(x)`.

use deunicode::deunicode;

/// Normalizes a string for matching.
///
/// Lowercase, diacritics folded to base Latin letters, non-alphanumeric
/// characters replaced by spaces, runs of whitespace collapsed, trimmed.
///
/// ## Example
/// ```rust
/// use tally_core::normalize::normalize;
///
/// assert_eq!(normalize("Áo Sơ Mi"), "ao so mi");
/// assert_eq!(normalize("AO SO MI"), "ao so mi");
/// assert_eq!(normalize("  Coca---Cola  330ml "), "coca cola 330ml");
/// ```
pub fn normalize(input: &str) -> String {
    let folded = deunicode(input).to_lowercase();

    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            // Punctuation and whitespace both become a single separator
            pending_space = true;
        }
    }

    out
}

/// Checks whether a string is empty after normalization.
///
/// Used to discard blank or punctuation-only lines before parsing.
#[inline]
pub fn is_blank(input: &str) -> bool {
    normalize(input).is_empty()
}
