use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const ROMAN_NUMERALS: [&str; 20] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV", "XV",
    "XVI", "XVII", "XVIII", "XIX", "XX",
];

// grave, acute, tilde, hook above, dot below
const TONE_MARKS: [char; 5] = ['\u{0300}', '\u{0301}', '\u{0303}', '\u{0309}', '\u{0323}'];

const ADMIN_PREFIXES: [&str; 9] = [
    "thanh pho",
    "thi tran",
    "thi xa",
    "dac khu",
    "phuong",
    "huyen",
    "quan",
    "tinh",
    "xa",
];

/// Canonical matching key for an administrative unit name.
///
/// Strips every diacritic, folds `đ` to `d`, turns separator punctuation into
/// spaces, converts whole-word upper-case Roman numerals (I to XX) into digits
/// and lower-cases the rest. The result is idempotent under re-normalization.
pub fn normalize_name(input: &str) -> String {
    let stripped = strip_marks(input);
    let spaced = stripped
        .chars()
        .map(|ch| if is_separator_punctuation(ch) { ' ' } else { ch })
        .collect::<String>();

    spaced
        .split_whitespace()
        .map(fold_word)
        .filter(|word| !word.is_empty())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Removes only the Vietnamese tone marks, keeping vowel-quality marks such as
/// the circumflex, breve and horn.
pub fn strip_tone_marks(input: &str) -> String {
    let lowered = input.to_lowercase();
    let kept = lowered
        .nfd()
        .filter(|ch| !TONE_MARKS.contains(ch))
        .nfc()
        .collect::<String>();

    condense_whitespace(&kept)
}

/// Drops one leading administrative type noun from an already normalized name.
pub fn strip_admin_prefix(normalized: &str) -> &str {
    for prefix in ADMIN_PREFIXES {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix(' ') {
                let rest = rest.trim_start();
                if !rest.is_empty() {
                    return rest;
                }
            }
        }
    }

    normalized
}

/// Lower-cased NFC spelling, sensitive to every diacritic.
pub fn exact_key(input: &str) -> String {
    condense_whitespace(&input.nfc().collect::<String>().to_lowercase())
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn strip_marks(input: &str) -> String {
    input
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| match ch {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Numerals are matched on the word without surrounding brackets or quotes,
/// so "(XII)" folds to "(12)".
fn fold_word(word: &str) -> String {
    let is_edge = |ch: char| !ch.is_alphanumeric();
    let core = word.trim_matches(is_edge);
    let word = match ROMAN_NUMERALS.iter().position(|numeral| *numeral == core) {
        Some(position) => {
            let start = word.len() - word.trim_start_matches(is_edge).len();
            format!("{}{}{}", &word[..start], position + 1, &word[start + core.len()..])
        }
        None => word.to_string(),
    };

    // Lower-casing can surface new combining marks (e.g. U+0130).
    strip_marks(&word.to_lowercase())
}

fn is_separator_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '-' | '\u{2010}'
            | '\u{2011}'
            | '\u{2012}'
            | '\u{2013}'
            | '\u{2014}'
            | '\''
            | '\u{2018}'
            | '\u{2019}'
            | '.'
            | ','
    )
}
