/// Amounts are kept in minor currency units (kopecks/cents).
pub type Cents = i64;

pub const CENTS_PER_UNIT: Cents = 100;

/// Build an amount from whole units and hundredths: `cents(45, 50)` is 45.50.
pub fn cents(units: i64, hundredths: i64) -> Cents {
    units * CENTS_PER_UNIT + hundredths
}

/// `percent` of `amount`, truncated toward zero.
pub fn percent_of(amount: Cents, percent: u32) -> Cents {
    amount * Cents::from(percent) / 100
}

/// Whole currency units contained in `amount`, dropping the fraction.
pub fn whole_units(amount: Cents) -> i64 {
    amount / CENTS_PER_UNIT
}

/// Render as `176.00`.
pub fn format_cents(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.abs();
    format!("{}{}.{:02}", sign, abs / CENTS_PER_UNIT, abs % CENTS_PER_UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_cents(17600), "176.00");
        assert_eq!(format_cents(1760), "17.60");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-250), "-2.50");
    }

    #[test]
    fn test_percent_truncates() {
        assert_eq!(percent_of(17600, 10), 1760);
        // 5% of 0.99 is 0.0495, truncated to 0.04
        assert_eq!(percent_of(99, 5), 4);
        assert_eq!(percent_of(cents(45, 50), 0), 0);
    }
}
