//! Terminal formatting helpers.
//!
//! Memecoin prices span many orders of magnitude, so precision scales with
//! the price: dollar-and-up prices get 2 decimals, sub-cent prices up to 8.

use rust_decimal::Decimal;

/// Formats a price with magnitude-dependent precision.
pub fn format_price(price: Decimal) -> String {
    let decimals = if price >= Decimal::ONE {
        2
    } else if price >= Decimal::new(1, 2) {
        4
    } else if price >= Decimal::new(1, 4) {
        6
    } else {
        8
    };
    format!("${:.prec$}", price, prec = decimals)
}

/// Formats a large value as K / M / B units.
pub fn format_magnitude(value: Decimal) -> String {
    let billion = Decimal::from(1_000_000_000u64);
    let million = Decimal::from(1_000_000u64);
    let thousand = Decimal::from(1_000u64);

    if value >= billion {
        format!("{:.2}B", value / billion)
    } else if value >= million {
        format!("{:.2}M", value / million)
    } else if value >= thousand {
        format!("{:.1}K", value / thousand)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_precision_scales_with_magnitude() {
        assert_eq!(format_price(dec!(42.1234)), "$42.12");
        assert_eq!(format_price(dec!(0.0623)), "$0.0623");
        assert_eq!(format_price(dec!(0.000712)), "$0.000712");
        assert_eq!(format_price(dec!(0.0000012345)), "$0.00000123");
    }

    #[test]
    fn magnitudes_humanise() {
        assert_eq!(format_magnitude(dec!(9_200_000_000)), "9.20B");
        assert_eq!(format_magnitude(dec!(45_600_000)), "45.60M");
        assert_eq!(format_magnitude(dec!(12_340)), "12.3K");
        assert_eq!(format_magnitude(dec!(512)), "512.00");
    }
}
