// Reservation pricing: nights x nightly rate plus the selected add-on services.

use chrono::NaiveDate;

/// Whole-night count for a stay. Absent dates, or a check-out that is not
/// strictly after the check-in, count as zero nights rather than an error.
pub fn nights_between(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> u32 {
    match (check_in, check_out) {
        (Some(start), Some(end)) if end > start => (end - start).num_days() as u32,
        _ => 0,
    }
}

/// Total charge for a reservation. Each selected service is counted once,
/// matching the fixed quantity of 1 used at submission. No rounding beyond
/// the currency's native precision, no conversion.
pub fn reservation_total(
    price_per_night: f64,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    service_prices: &[f64],
) -> f64 {
    let nights = nights_between(check_in, check_out) as f64;
    nights * price_per_night + service_prices.iter().sum::<f64>()
}
