/// Format a float as rupees with Indian digit grouping: ₹1,23,456.78
pub fn rupees(val: f64) -> String {
    let negative = val < 0.0;
    let paise = format!("{:.2}", val.abs());
    let (int_part, dec_part) = paise.split_once('.').unwrap_or((paise.as_str(), "00"));

    // Last three digits, then groups of two.
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    let head_len = digits.len().saturating_sub(3);
    for (i, c) in digits[..head_len].iter().enumerate() {
        if i > 0 && (head_len - i) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    if head_len > 0 {
        grouped.push(',');
    }
    grouped.extend(&digits[head_len..]);

    if negative {
        format!("-₹{grouped}.{dec_part}")
    } else {
        format!("₹{grouped}.{dec_part}")
    }
}

/// Blank for zero so deposit and withdrawal columns read like a passbook.
pub fn rupees_or_blank(val: f64) -> String {
    if val == 0.0 {
        String::new()
    } else {
        rupees(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupee_formatting() {
        assert_eq!(rupees(1234.56), "₹1,234.56");
        assert_eq!(rupees(-500.00), "-₹500.00");
        assert_eq!(rupees(0.0), "₹0.00");
        assert_eq!(rupees(123456.78), "₹1,23,456.78");
        assert_eq!(rupees(10000000.0), "₹1,00,00,000.00");
        assert_eq!(rupees(42.10), "₹42.10");
    }

    #[test]
    fn test_blank_for_zero() {
        assert_eq!(rupees_or_blank(0.0), "");
        assert_eq!(rupees_or_blank(15000.0), "₹15,000.00");
    }
}
