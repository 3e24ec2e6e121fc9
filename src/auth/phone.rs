//! Phone number normalisation

/// Country code assumed for bare national numbers
const DEFAULT_COUNTRY_CODE: &str = "91";

/// Normalise user input to E.164 (`+<country><number>`).
///
/// Spaces, dashes and parentheses are ignored. A bare 10-digit number (or one
/// with a leading trunk `0`) is treated as Indian.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed
            .chars()
            .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+')))
    {
        return None;
    }

    let has_plus = trimmed.starts_with('+');
    if trimmed.matches('+').count() > usize::from(has_plus) {
        return None;
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    let e164 = if has_plus {
        digits
    } else if digits.len() == 10 {
        format!("{DEFAULT_COUNTRY_CODE}{digits}")
    } else if digits.len() == 11 && digits.starts_with('0') {
        format!("{DEFAULT_COUNTRY_CODE}{}", &digits[1..])
    } else if digits.len() == 12 && digits.starts_with(DEFAULT_COUNTRY_CODE) {
        digits
    } else {
        return None;
    };

    if !(8..=15).contains(&e164.len()) || e164.starts_with('0') {
        return None;
    }
    Some(format!("+{e164}"))
}
