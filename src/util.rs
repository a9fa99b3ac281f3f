// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" CSV/number handling so the rest of the
// code can assume clean, typed values.
use crate::types::BoxStats;
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;

/// Cell texts that CSV tooling conventionally reads as a null value.
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A field is missing when it is empty or exactly one of [`NA_TOKENS`].
/// Whitespace-only text is a value, not a null.
pub fn is_missing(s: &str) -> bool {
    NA_TOKENS.contains(&s)
}

/// Parse a CSV field into a finite `f64`.
///
/// - Trims whitespace.
/// - Returns `None` for blank input, text, `NaN` and infinities.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn sort_floats(v: &mut [f64]) {
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Quantile `p` in `[0, 1]` of an ascending slice, interpolating linearly
/// between the two closest ranks at position `p * (n - 1)`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Same interpolation as [`quantile_sorted`] for the quantile `k / m`, with the
/// rank position computed in integers so boundaries that fall exactly on a
/// rank are hit exactly.
pub fn quantile_ratio_sorted(sorted: &[f64], k: usize, m: usize) -> Option<f64> {
    if sorted.is_empty() || m == 0 || k > m {
        return None;
    }
    let scaled = k * (sorted.len() - 1);
    let lo = scaled / m;
    let rem = scaled % m;
    if rem == 0 {
        return Some(sorted[lo]);
    }
    let frac = rem as f64 / m as f64;
    Some(sorted[lo] + (sorted[lo + 1] - sorted[lo]) * frac)
}

pub fn median(mut v: Vec<f64>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    sort_floats(&mut v);
    quantile_sorted(&v, 0.5).unwrap_or(0.0)
}

pub fn box_stats(mut v: Vec<f64>) -> Option<BoxStats> {
    if v.is_empty() {
        return None;
    }
    sort_floats(&mut v);
    Some(BoxStats {
        min: v[0],
        q1: quantile_sorted(&v, 0.25)?,
        median: quantile_sorted(&v, 0.5)?,
        q3: quantile_sorted(&v, 0.75)?,
        max: v[v.len() - 1],
    })
}

/// Pearson correlation of two equally long samples. Returns `None` when the
/// lengths differ, there are fewer than two points, or either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = average(x);
    let my = average(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
pub fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Render a float for the cleaned table so it always reads back as a float:
/// `0.0`, `29.85`, `1889.5`.
pub fn format_float(n: f64) -> String {
    let s = n.to_string();
    if s.contains('.') || !n.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages, e.g. `7,043 rows loaded`.
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing_na_tokens() {
        for token in ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>"] {
            assert!(is_missing(token), "{:?} should be missing", token);
        }
    }

    #[test]
    fn test_is_missing_keeps_text_values() {
        for value in [" ", "  ", "No", "None of these", "na ", "Electronic check", "0"] {
            assert!(!is_missing(value), "{:?} should be a value", value);
        }
    }

    #[test]
    fn test_parse_f64_safe() {
        assert_eq!(parse_f64_safe(Some(" 29.85 ")), Some(29.85));
        assert_eq!(parse_f64_safe(Some(" ")), None);
        assert_eq!(parse_f64_safe(Some("abc")), None);
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn test_parse_i64_safe() {
        assert_eq!(parse_i64_safe(Some("12")), Some(12));
        assert_eq!(parse_i64_safe(Some("12.5")), None);
        assert_eq!(parse_i64_safe(Some("")), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&v, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&v, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&v, 0.5), Some(2.5));
        let q = quantile_sorted(&v, 1.0 / 3.0).unwrap();
        assert!((q - 2.0).abs() < 1e-9);
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_quantile_ratio_exact_ranks() {
        let v: Vec<f64> = (1..=10).map(f64::from).collect();
        // (n - 1) = 9 is divisible by 3, so the tertiles sit on ranks 3 and 6.
        assert_eq!(quantile_ratio_sorted(&v, 1, 3), Some(4.0));
        assert_eq!(quantile_ratio_sorted(&v, 2, 3), Some(7.0));
        let w = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];
        let q1 = quantile_ratio_sorted(&w, 1, 3).unwrap();
        assert!((q1 - (30.0 + 10.0 * 2.0 / 3.0)).abs() < 1e-9);
        assert_eq!(quantile_ratio_sorted(&[], 1, 3), None);
        assert_eq!(quantile_ratio_sorted(&w, 4, 3), None);
    }

    #[test]
    fn test_median_and_box_stats() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![]), 0.0);
        let b = box_stats(vec![5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!((b.min, b.q1, b.median, b.q3, b.max), (1.0, 2.0, 3.0, 4.0, 5.0));
        assert!(box_stats(vec![]).is_none());
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0];
        let up = pearson(&x, &[2.0, 4.0, 6.0]).unwrap();
        let down = pearson(&x, &[3.0, 2.0, 1.0]).unwrap();
        assert!((up - 1.0).abs() < 1e-12);
        assert!((down + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0]).is_none());
        assert!(pearson(&x, &[1.0]).is_none());
    }

    #[test]
    fn test_format_float_keeps_decimal_point() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(29.85), "29.85");
        assert_eq!(format_float(1889.5), "1889.5");
        assert_eq!(format_float(100.0), "100.0");
        assert_eq!(format_float(1e21), "1000000000000000000000.0");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(3.0, 0), "3");
        assert_eq!(format_int(7043), "7,043");
    }

    #[test]
    fn test_pct_and_round() {
        assert_eq!(pct(1, 4), 25.0);
        assert_eq!(pct(1, 0), 0.0);
        assert_eq!(round2(42.857142), 42.86);
    }
}
