use serde::Serializer;

// ============================================================================
// Numeric policy
// ============================================================================
//
// Sums accumulate at full precision. Rounding happens once, on the way out:
// currency at serialization (2 decimals), percentages where computed.
// Every division is guarded; nothing here returns NaN or infinity.
//
// ============================================================================

pub const CURRENCY_DECIMALS: u32 = 2;
pub const GROWTH_DECIMALS: u32 = 2;
pub const SHARE_DECIMALS: u32 = 1;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    // + 0.0 turns -0.0 into 0.0
    (value * factor).round() / factor + 0.0
}

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Share of `part` in `whole` as a rounded percentage
pub fn percentage(part: f64, whole: f64, decimals: u32) -> f64 {
    round_to(ratio(part, whole) * 100.0, decimals)
}

/// Relative change from `previous` to `current`. A zero baseline is 0% growth.
pub fn growth_pct(current: f64, previous: f64, decimals: u32) -> f64 {
    round_to(ratio(current - previous, previous) * 100.0, decimals)
}

/// serde helper: money rounded to cents at the presentation boundary
pub fn serialize_money<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, CURRENCY_DECIMALS))
}
