//! Slug derivation for channel and category identifiers.
//!
//! A slug is the lowercase, hyphen-separated form of a display string:
//! diacritics folded to their ASCII base letter, every other
//! non-alphanumeric run collapsed into a single hyphen.

/// Fold a single character to its undecorated ASCII base, if it has one.
///
/// Covers the Latin-1 range plus the few extras that show up in
/// real-world playlist titles; anything else passes through unchanged.
const fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Derive a slug from a display string.
///
/// Returns an empty string when the input contains no alphanumeric
/// characters at all; callers treat that as "no slug" and fall through
/// to their next identifier source.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        let folded = fold_diacritic(lower);

        if folded.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(folded);
        } else {
            pending_hyphen = true;
        }
    }

    out
}
