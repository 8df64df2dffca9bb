//! Currency formatting: fixed symbol prefix, two decimals, thousands separators.

/// Default currency symbol (Indian rupee).
pub const DEFAULT_SYMBOL: &str = "₹";

/// Format `amount` as e.g. `₹1,234.50`; negatives render as `₹-1,234.50`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed.bytes().any(|b| b != b'0' && b != b'.') {
        "-"
    } else {
        ""
    };
    format!("{symbol}{sign}{grouped}.{frac_part}")
}

pub fn format_inr(amount: f64) -> String {
    format_currency(amount, DEFAULT_SYMBOL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(250.0), "₹250.00");
        assert_eq!(format_inr(1234.5), "₹1,234.50");
        assert_eq!(format_inr(1234567.891), "₹1,234,567.89");
        assert_eq!(format_inr(100000.0), "₹100,000.00");
    }

    #[test]
    fn test_negative_and_symbol() {
        assert_eq!(format_currency(-1234.5, "$"), "$-1,234.50");
        assert_eq!(format_currency(-0.001, "$"), "$0.00");
    }
}
