//! Conversion of raw argument text into booleans, integers and reals.
//!
//! The accepted grammars are strict: no surrounding whitespace, no
//! radix prefixes, no `inf`/`nan` spellings.

/// Boolean spellings accepted in definition defaults, matched case-insensitively.
const TRUE_WORDS: [&str; 4] = ["true", "yes", "on", "1"];
const FALSE_WORDS: [&str; 4] = ["false", "no", "off", "0"];

/// Check whether text is a recognised boolean spelling.
pub fn is_bool(text: &str) -> bool {
    to_bool(text).is_some()
}

/// Convert a boolean spelling (`true/false/yes/no/on/off/1/0`).
pub fn to_bool(text: &str) -> Option<bool> {
    if TRUE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

/// Check whether text is an integer literal: optional sign followed by digits.
///
/// Literals that do not fit in an `i64` are rejected.
pub fn is_integer(text: &str) -> bool {
    to_integer(text).is_some()
}

/// Convert an integer literal to `i64`.
pub fn to_integer(text: &str) -> Option<i64> {
    let digits = strip_sign(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>().ok()
}

/// Check whether text is a floating-point literal.
///
/// Grammar: `[+-] (digits [. digits*] | . digits) [(e|E) [+-] digits]`.
pub fn is_real(text: &str) -> bool {
    to_real(text).is_some()
}

/// Convert a floating-point literal to `f64`.
pub fn to_real(text: &str) -> Option<f64> {
    if !is_real_literal(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

fn strip_sign(text: &str) -> &str {
    text.strip_prefix('+')
        .or_else(|| text.strip_prefix('-'))
        .unwrap_or(text)
}

fn is_real_literal(text: &str) -> bool {
    let body = strip_sign(text);

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
        None => (mantissa, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp_digits = strip_sign(exp);
            !exp_digits.is_empty() && all_digits(exp_digits)
        }
    }
}
