//! Per-field normalization of dictated or typed text.
//!
//! Each record attribute has a [`FieldRule`] in a static table. A rule may opt
//! into the null-word filter (spoken "nulo" clears the field) and the digit
//! filter, then applies its own transform.

use std::sync::LazyLock;

use intake_core::FieldKey;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Words that mean "leave this field empty" when they are the whole input.
const NULL_WORDS: [&str; 5] = ["nulo", "null", "ninguno", "na", "n/a"];

/// Client-type keywords in priority order.
const CLIENT_TYPES: [(&str, &str); 4] = [
    ("nuevo", "Nuevo"),
    ("antiguo", "Antiguo"),
    ("fidelizado", "Fidelizado"),
    ("recuperado", "Recuperado"),
];

struct FieldRule {
    key: FieldKey,
    null_words: bool,
    digits_only: bool,
    transform: fn(&str) -> String,
}

const DEFAULT_RULE: FieldRule = FieldRule {
    key: FieldKey::Ciudad,
    null_words: false,
    digits_only: false,
    transform: trimmed,
};

static RULES: [FieldRule; 11] = [
    FieldRule { key: FieldKey::Nit, null_words: true, digits_only: true, transform: trimmed },
    FieldRule { key: FieldKey::Empresa, null_words: true, digits_only: false, transform: upper_collapsed },
    FieldRule { key: FieldKey::Ciudad, null_words: false, digits_only: false, transform: trimmed },
    FieldRule { key: FieldKey::Cliente, null_words: true, digits_only: false, transform: upper_collapsed },
    FieldRule { key: FieldKey::Celular, null_words: true, digits_only: true, transform: without_whitespace },
    FieldRule { key: FieldKey::Correo, null_words: true, digits_only: false, transform: transcribe_email },
    FieldRule { key: FieldKey::TipoCliente, null_words: false, digits_only: false, transform: client_type },
    FieldRule { key: FieldKey::Concepto, null_words: false, digits_only: false, transform: upper_collapsed },
    FieldRule { key: FieldKey::MedioContacto, null_words: false, digits_only: false, transform: trimmed },
    FieldRule { key: FieldKey::AsignadoA, null_words: false, digits_only: false, transform: trimmed },
    FieldRule { key: FieldKey::LineaVenta, null_words: false, digits_only: false, transform: trimmed },
];

fn rule_for(key: FieldKey) -> &'static FieldRule {
    RULES.iter().find(|r| r.key == key).unwrap_or(&DEFAULT_RULE)
}

/// Turn raw text for `key` into the value stored in the record.
pub fn normalize(key: FieldKey, raw: &str) -> String {
    let rule = rule_for(key);

    if rule.null_words && is_null_word(raw) {
        return String::new();
    }

    let value = if rule.digits_only {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        (rule.transform)(&digits)
    } else {
        (rule.transform)(raw)
    };

    // A transform can assemble a null word from fragments ("n a" -> "na").
    if rule.null_words && is_null_word(&value) {
        return String::new();
    }
    value
}

/// True if `raw` is, ignoring case and surrounding whitespace, one of the
/// words an operator says to leave a field empty.
pub fn is_null_word(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    NULL_WORDS.contains(&lowered.as_str())
}

fn trimmed(raw: &str) -> String {
    raw.trim().to_string()
}

fn upper_collapsed(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn without_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn client_type(raw: &str) -> String {
    let clean = raw.trim();
    let lowered = clean.to_lowercase();
    CLIENT_TYPES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| clean.to_string())
}

// =============================================================================
// Email dictation
// =============================================================================

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

// Phrases before the single words they contain: "guion bajo" must not
// become "-bajo".
static EMAIL_WORDS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"guion\s*bajo", "_"),
        (r"sub\s*guion", "_"),
        (r"underscore", "_"),
        (r"guion\s*medio", "-"),
        (r"guion", "-"),
        (r"punto", "."),
        (r"coma", "."),
        (r"arroba", "@"),
        (r"espacio", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("Invalid email dictation regex"),
            replacement,
        )
    })
    .collect()
});

/// Transcribe a dictated address ("juan punto perez arroba gmail punto com")
/// into `juan.perez@gmail.com`.
///
/// Passes repeat until the output stops changing, so the result is a fixed
/// point: removing whitespace can join fragments ("pun to") into a keyword
/// that a second pass would otherwise rewrite. Every pass that changes the
/// text shortens it, so the loop ends.
pub fn transcribe_email(raw: &str) -> String {
    let mut current = transcribe_email_pass(raw);
    loop {
        let next = transcribe_email_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn transcribe_email_pass(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let collapsed = WHITESPACE_RE.replace_all(&lowered, " ");
    let mut text = strip_accents(collapsed.trim());

    for (pattern, replacement) in EMAIL_WORDS.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    WHITESPACE_RE.replace_all(&text, "").into_owned()
}

fn strip_accents(text: &str) -> String {
    text.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}
