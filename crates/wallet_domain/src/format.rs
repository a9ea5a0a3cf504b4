//! Display helpers for card numbers and expiry strings.

pub fn strip_spaces(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `4111111111111111` -> `4111 1111 1111 1111`
pub fn format_card_number(number: &str) -> String {
    let digits: Vec<char> = strip_spaces(number).chars().collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shows only the last four digits.
pub fn mask_card_number(number: &str) -> String {
    let cleaned: Vec<char> = strip_spaces(number).chars().collect();
    let last4: String = cleaned[cleaned.len().saturating_sub(4)..].iter().collect();
    format!("**** **** **** {last4}")
}

/// `MMYY` -> `MM/YY`; anything else is returned as is.
pub fn format_expiry_date(expiry: &str) -> String {
    if expiry.len() == 4 && expiry.is_char_boundary(2) {
        let (month, year) = expiry.split_at(2);
        format!("{month}/{year}")
    } else {
        expiry.to_string()
    }
}
