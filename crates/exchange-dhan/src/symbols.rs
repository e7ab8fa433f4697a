//! Exchange trading-symbol construction.

use chrono::NaiveDate;
use strangle_core::OptionRight;

/// Builds the Dhan trading symbol for an index option.
///
/// The exchange format is `{underlying}{DDMMMYYYY}{strike}{CE|PE}` with the
/// expiry month uppercased, e.g. `BANKNIFTY25SEP202548300CE`.
#[must_use]
pub fn option_symbol(
    underlying: &str,
    expiry: NaiveDate,
    strike: i64,
    right: OptionRight,
) -> String {
    let expiry_part = expiry.format("%d%b%Y").to_string().to_uppercase();
    format!("{underlying}{expiry_part}{strike}{}", right.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_call_symbol() {
        let expiry = NaiveDate::from_ymd_opt(2025, 9, 25).unwrap();
        assert_eq!(
            option_symbol("BANKNIFTY", expiry, 48300, OptionRight::Call),
            "BANKNIFTY25SEP202548300CE"
        );
    }

    #[test]
    fn formats_put_symbol() {
        let expiry = NaiveDate::from_ymd_opt(2025, 9, 25).unwrap();
        assert_eq!(
            option_symbol("BANKNIFTY", expiry, 47700, OptionRight::Put),
            "BANKNIFTY25SEP202547700PE"
        );
    }

    #[test]
    fn zero_pads_single_digit_days() {
        let expiry = NaiveDate::from_ymd_opt(2025, 10, 2).unwrap();
        assert_eq!(
            option_symbol("NIFTY", expiry, 25000, OptionRight::Call),
            "NIFTY02OCT202525000CE"
        );
    }
}
