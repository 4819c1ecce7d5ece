use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Rates are currency: two places after the point.
pub const RATE_SCALE: u32 = 2;

/// Parse a rate field as an exact decimal. No rounding happens here.
pub fn parse_rate(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(raw)
}

/// Round to cents, midpoints away from zero.
pub fn to_cents(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `300` -> `"300.00"`, `245.2` -> `"245.20"`, `100.004` -> `"100.00"`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{:.2}", to_cents(rate))
}
