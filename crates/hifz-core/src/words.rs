//! Word classification: diacritic stripping, first letters, particles.
//!
//! All functions here are total. Malformed or empty text degrades to an empty
//! answer instead of failing.

/// Grammatical particles drilled by keyword mode, in stripped and
/// alef-normalized form.
///
/// The set is fixed. Matching is exact against the whole word.
pub const PARTICLES: &[&str] = &[
    // single-letter proclitics written alone
    "و", "ف", "ب", "ل", "ك",
    // prepositions
    "في", "من", "على", "الى", "عن", "حتى", "مع", "عند", "لدى",
    // negation, restriction, interrogation
    "لا", "ما", "لم", "لن", "الا", "هل", "ا", "ليس",
    // conjunctions and emphasis
    "ان", "انما", "ثم", "او", "ام", "بل", "لكن", "قد", "كي", "اذ", "اذا", "لما", "لو", "يا",
    // demonstratives and relatives
    "ذلك", "تلك", "هذا", "هذه", "اولئك", "الذي", "التي", "الذين",
    // detached pronouns
    "هو", "هي", "هم", "هما", "هن", "انت", "انتم", "نحن", "انا",
    // common fused forms
    "ولا", "وما", "فلا", "بما", "مما", "ومما", "فيه", "فيها", "عليهم", "اليك",
];

/// Returns `true` for Arabic combining marks: harakat, tanween, shadda, sukun,
/// superscript alef, Quranic annotation signs, and the tatweel.
pub fn is_diacritic(c: char) -> bool {
    matches!(
        c,
        '\u{0610}'..='\u{061A}'
            | '\u{064B}'..='\u{065F}'
            | '\u{0670}'
            | '\u{06D6}'..='\u{06DC}'
            | '\u{06DF}'..='\u{06E8}'
            | '\u{06EA}'..='\u{06ED}'
            | '\u{0640}'
    )
}

/// Remove every diacritic codepoint from `text`.
pub fn strip_diacritics(text: &str) -> String {
    text.chars().filter(|c| !is_diacritic(*c)).collect()
}

/// Fold the hamza and wasla forms of alef onto a bare alef.
fn normalize_alef(c: char) -> char {
    match c {
        'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
        other => other,
    }
}

/// First letter of a word with its diacritics removed.
///
/// Falls back to the raw first character when the text has no letters, and
/// to an empty string for empty text.
pub fn first_letter(text: &str) -> String {
    strip_diacritics(text)
        .chars()
        .find(|c| c.is_alphabetic())
        .or_else(|| text.chars().next())
        .map(String::from)
        .unwrap_or_default()
}

/// Hint form of a word: its first letter followed by an elision mark.
pub fn hint_text(text: &str) -> String {
    let letter = first_letter(text);
    if letter.is_empty() {
        letter
    } else {
        format!("{letter}…")
    }
}

/// Comparison form of a word: trimmed, diacritics stripped, alef folded.
pub fn normalize(text: &str) -> String {
    strip_diacritics(text.trim())
        .chars()
        .map(normalize_alef)
        .collect()
}

/// Returns `true` if the word is a grammatical particle rather than a content word.
pub fn is_particle(text: &str) -> bool {
    let bare = normalize(text);
    !bare.is_empty() && PARTICLES.contains(&bare.as_str())
}
