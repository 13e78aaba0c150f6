//! Normalized deviation between two counts.

use crate::types::Counts;

/// `|count1 - count2| / (2 * sqrt(count1 + count2))`.
///
/// Undefined when both counts are zero; go through [`deviation`] unless the
/// caller has already checked the sum.
pub fn normalised_deviation(count1: f64, count2: f64) -> f64 {
  debug_assert!(count1 + count2 > 0.0, "normalised_deviation called with empty counts");
  (count1 - count2).abs() / (2.0 * (count1 + count2).sqrt())
}

/// Guarded deviation: `None` when the pair cannot be compared (zero sum,
/// negative or non-finite count).
pub fn deviation(counts: Counts) -> Option<f64> {
  let Counts { count1, count2 } = counts;
  if !count1.is_finite() || !count2.is_finite() || count1 < 0.0 || count2 < 0.0 {
    return None;
  }
  if count1 + count2 <= 0.0 {
    return None;
  }
  Some(normalised_deviation(count1, count2))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn counts(count1: f64, count2: f64) -> Counts {
    Counts { count1, count2 }
  }

  #[test]
  fn reference_value() {
    // 22 / (2 * sqrt(122))
    let d = normalised_deviation(50.0, 72.0);
    assert!((d - 0.995_893).abs() < 1e-6, "got {}", d);
  }

  #[test]
  fn symmetric_in_arguments() {
    for (a, b) in [(0.0, 3.0), (1.0, 2.0), (50.0, 72.0), (0.25, 1234.5), (9e6, 1.0)] {
      assert_eq!(normalised_deviation(a, b), normalised_deviation(b, a));
    }
  }

  #[test]
  fn identical_counts_give_zero() {
    for x in [0.5, 1.0, 60.0, 12345.0] {
      assert_eq!(normalised_deviation(x, x), 0.0);
    }
  }

  #[test]
  fn exact_one_for_twelve_and_four() {
    assert_eq!(normalised_deviation(12.0, 4.0), 1.0);
    assert_eq!(normalised_deviation(0.0, 4.0), 1.0);
  }

  #[test]
  fn guard_rejects_empty_sum() {
    assert_eq!(deviation(counts(0.0, 0.0)), None);
  }

  #[test]
  fn guard_rejects_negative_and_nan() {
    assert_eq!(deviation(counts(-1.0, 5.0)), None);
    assert_eq!(deviation(counts(f64::NAN, 5.0)), None);
    assert_eq!(deviation(counts(f64::INFINITY, 5.0)), None);
  }

  #[test]
  fn guard_passes_through_valid_pairs() {
    assert_eq!(deviation(counts(50.0, 72.0)), Some(normalised_deviation(50.0, 72.0)));
    assert_eq!(deviation(counts(0.0, 9.0)), Some(1.5));
  }
}
