//! Textual tone inference for a person's ring color.
//!
//! Source records carry no gender field, so the visual side of a person is
//! guessed from gendered keywords in the name and titles. The guess is kept
//! as a pure function so the graph builder can fall back to role votes when
//! the text is ambiguous.

/// Keywords that pull toward the blue ring.
const BLUE_KEYWORDS: &[&str] = &[
    "king", "prince", "duke", "earl", "count", "baron", "viscount", "emperor",
    "tsar", "lord", "sir", "father", "son", "grandfather", "mr",
];

/// Keywords that pull toward the orange ring.
const ORANGE_KEYWORDS: &[&str] = &[
    "queen", "princess", "duchess", "countess", "baroness", "viscountess",
    "empress", "tsarina", "lady", "dame", "mother", "daughter", "grandmother",
    "mrs", "ms",
];

/// Outcome of the textual inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneHint {
    Blue,
    Orange,
    /// No keyword matched, or both sides matched.
    Ambiguous,
}

/// Infer a tone from a person's name and titles.
pub fn infer_tone(full_name: &str, titles: &[String]) -> ToneHint {
    let mut blue = false;
    let mut orange = false;

    let words = full_name
        .split_whitespace()
        .chain(titles.iter().flat_map(|t| t.split_whitespace()));

    for word in words {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        // Orange first: several orange keywords contain a blue one ("countess").
        if ORANGE_KEYWORDS.contains(&word.as_str()) {
            orange = true;
        } else if BLUE_KEYWORDS.contains(&word.as_str()) {
            blue = true;
        }
    }

    match (blue, orange) {
        (true, false) => ToneHint::Blue,
        (false, true) => ToneHint::Orange,
        _ => ToneHint::Ambiguous,
    }
}
