use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Mis-encoding fixups applied before Unicode normalization: mangled ligatures,
/// a misplaced combining acute, typographic punctuation that should collapse
/// to ASCII, and stray C0 control characters.
const FIXUPS: &[(&str, &str)] = &[
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB00}", "ff"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{2026}", "..."),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{00B4}", "'"),
    ("\u{0060}", "'"),
];

/// A letter immediately doubled (`"PP"`, `"aa"`).
static LETTER_PAIR_RE: OnceLock<Regex> = OnceLock::new();
/// A punctuation mark immediately doubled, from a small safe set.
static PUNCT_PAIR_RE: OnceLock<Regex> = OnceLock::new();
/// Runs of 2+ whitespace characters.
static WHITESPACE_RUN_RE: OnceLock<Regex> = OnceLock::new();
/// Runs of 3+ identical non-digit characters collapse to a single character.
/// Digit runs (serial numbers, part numbers, years) are left untouched.
static LONG_DUP_RE: OnceLock<Regex> = OnceLock::new();
/// A lowercase letter immediately followed by a mis-encoded acute mark.
static ACCENT_RE: OnceLock<Regex> = OnceLock::new();

fn letter_pair_re() -> &'static Regex {
    LETTER_PAIR_RE.get_or_init(|| Regex::new(r"([A-Za-z])\1").unwrap())
}

fn punct_pair_re() -> &'static Regex {
    PUNCT_PAIR_RE.get_or_init(|| Regex::new(r"([.,;:!?])\1").unwrap())
}

fn whitespace_run_re() -> &'static Regex {
    WHITESPACE_RUN_RE.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap())
}

fn long_dup_re() -> &'static Regex {
    LONG_DUP_RE.get_or_init(|| Regex::new(r"(\D)\1{2,}").unwrap())
}

fn accent_re() -> &'static Regex {
    ACCENT_RE.get_or_init(|| Regex::new(r"([aeiouAEIOU])\x{00B4}").unwrap())
}

/// Collapse encoding-artifact character duplication (`"PPAARRA"` -> `"PARA"`,
/// `"informacion.."` -> `"informacion."`), leaving digit runs untouched so
/// serial numbers and years survive.
pub fn fix_duplicated_characters(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = letter_pair_re().replace_all(text, "$1").into_owned();
    out = punct_pair_re().replace_all(&out, "$1").into_owned();
    out = whitespace_run_re().replace_all(&out, " ").into_owned();
    out = long_dup_re()
        .replace_all(&out, |caps: &regex::Captures| caps[1].to_string())
        .into_owned();
    out
}

/// Normalize mis-encoded text: collapse duplicated characters, fix known
/// ligature/punctuation mojibake, strip C0 control characters, and fold to
/// Unicode NFC. Grounded in the corresponding Python routine's behavior, not
/// its implementation — no transliteration, just the same observable fixups.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = fix_duplicated_characters(text);

    for (bad, good) in FIXUPS {
        if out.contains(bad) {
            out = out.replace(bad, good);
        }
    }

    out = accent_re().replace_all(&out, "$1\u{0301}").into_owned();

    out = out.chars().filter(|c| !is_c0_control(*c)).collect();

    out.nfc().collect()
}

fn is_c0_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}') && c != '\n' && c != '\t' && c != '\r'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_duplicated_letters_but_not_digits() {
        assert_eq!(fix_duplicated_characters("PPAARRA"), "PARA");
        assert_eq!(fix_duplicated_characters("serial 11122233"), "serial 11122233");
    }

    #[test]
    fn fixes_ligatures_and_dashes() {
        let input = "soﬁsticated \u{2014} advanced";
        let out = normalize_text(input);
        assert!(out.contains("sofisticated"));
        assert!(out.contains('-'));
    }

    #[test]
    fn strips_control_characters() {
        let input = "hello\u{0007}world";
        assert_eq!(normalize_text(input), "helloworld");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_text(""), "");
    }
}
