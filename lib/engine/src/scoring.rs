//! Relatedness scoring
//!
//! A binomial z-score of the foreground count against the count expected
//! from the background rate, squashed into `[0, 1]` by a blend of five
//! shifted sigmoids. A value distributed exactly as in the background scores
//! 0.5; over-represented values approach 1, under-represented approach 0.

const DENOMINATOR_FLOOR: f64 = 1e-10;
const SIGMOIDS: [(f64, f64); 5] = [(-80.0, 50.0), (-30.0, 30.0), (0.0, 30.0), (30.0, 30.0), (80.0, 50.0)];
const SIGMOID_WEIGHT: f64 = 0.2;

/// Relatedness of a value given both population sizes and its counts in each.
///
/// Rounded to 5 decimal places. Never NaN: an empty background is treated as
/// a background rate of zero and a zero denominator is floored.
pub fn relatedness(fg_total: u64, bg_total: u64, fg_count: f64, bg_count: f64) -> f64 {
    let fg_total = fg_total as f64;
    let bg_prob = if bg_total == 0 { 0.0 } else { bg_count / bg_total as f64 };

    let num = fg_count - fg_total * bg_prob;
    let variance = (fg_total * bg_prob * (1.0 - bg_prob)).max(0.0);
    let mut denom = variance.sqrt();
    if denom == 0.0 {
        denom = DENOMINATOR_FLOOR;
    }
    let z = num / denom;

    let blend: f64 = SIGMOIDS
        .iter()
        .map(|&(offset, scale)| SIGMOID_WEIGHT * sigmoid(z, offset, scale))
        .sum();

    round_to(0.5 * (1.0 + blend), 1e5)
}

#[inline]
fn sigmoid(x: f64, offset: f64, scale: f64) -> f64 {
    (x + offset) / (scale + (x + offset).abs())
}

#[inline]
fn round_to(value: f64, factor: f64) -> f64 {
    (value * factor).round() / factor
}

/// Raw count as occurrences per million corpus documents, rounded to nearest
pub fn rate_per_million(total_docs: u64, raw: f64) -> f64 {
    let total = total_docs.max(1) as f64;
    (raw * 1e6 / total).round()
}
