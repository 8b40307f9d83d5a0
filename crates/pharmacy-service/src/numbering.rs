//! Human-facing reference numbers for sales, prescriptions and purchases.

use chrono::NaiveDate;
use uuid::Uuid;

pub const SALE_PREFIX: &str = "VTE";
pub const PRESCRIPTION_PREFIX: &str = "ORD";
pub const PURCHASE_PREFIX: &str = "ACH";

/// `PREFIX-YYYYMMDD-XXXXXX` with six random uppercase hex digits.
pub fn reference_number(prefix: &str, date: NaiveDate) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}-{}-{}",
        date.format("%Y%m%d"),
        random[..6].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_number_shape() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let number = reference_number(SALE_PREFIX, date);
        assert!(number.starts_with("VTE-20260310-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
