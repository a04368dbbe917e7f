//! Fixed-payment loan amortization.

/// Monthly payment on a fixed-rate loan.
///
/// `apr` is the annual rate as a fraction, `years` the term and
/// `principal` the amount financed.  A zero term is a cash purchase and
/// costs nothing per month; a zero rate repays the principal in equal
/// instalments.  Any other input goes through the standard annuity
/// formula without validation.
pub fn monthly_payment(apr: f64, years: u32, principal: f64) -> f64 {
    if years == 0 {
        return 0.0;
    }

    let r = apr / 12.0;
    let n = f64::from(years) * 12.0;

    if r == 0.0 {
        return principal / n;
    }

    r * principal / (1.0 - (1.0 + r).powf(-n))
}
