//! Price normalization.
//!
//! Storefront pages carry locale-formatted price text such as
//! `"1,698,000 تومان"`; the table and diff logic work on plain integers.

/// Display string used in place of a formatted price when the amount is
/// unknown. Callers substitute this for a zero price; the formatter itself
/// does not special-case zero.
pub const CONTACT_FOR_PRICE: &str = "تماس بگیرید";

/// Parse locale-formatted price text into a whole toman amount.
///
/// Strips every non-digit character and parses the remainder as base 10.
/// Empty or unparseable input yields 0, never an error.
pub fn parse_price(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Format a toman amount with thousands separators and the currency suffix.
pub fn format_price(price: u64) -> String {
    format!("{} تومان", group_thousands(price))
}

/// Display form for a price: formatted amount, or the contact phrase for 0.
pub fn display_price(price: u64) -> String {
    if price == 0 {
        CONTACT_FOR_PRICE.to_string()
    } else {
        format_price(price)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
