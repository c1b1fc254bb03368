//! Cent rounding

/// Round to whole cents, half away from zero
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `percent` of `amount`, rounded to cents
pub fn percent_of(amount: f64, percent: f64) -> f64 {
    round_cents(amount * percent / 100.0)
}
