//! Derived review aggregates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The derived rating fields of a product, computed from its review list.
///
/// These values are never edited independently: every mutation of the
/// review collection recomputes the summary from the resulting collection
/// and persists both fields together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of reviews.
    pub count: i64,
    /// Mean rating, rounded to two decimal places. Zero when there are no
    /// reviews.
    pub average: Decimal,
}

impl RatingSummary {
    /// An empty summary: no reviews, average 0.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            average: Decimal::ZERO,
        }
    }

    /// Compute the summary for a review collection.
    ///
    /// An empty collection yields a zero average rather than a division
    /// error.
    #[must_use]
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self::empty();
        }

        let count = ratings.len() as i64;
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let average = (Decimal::from(sum) / Decimal::from(count)).round_dp(2);

        Self { count, average }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_yields_zero_average() {
        let summary = RatingSummary::from_ratings(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, Decimal::ZERO);
    }

    #[test]
    fn two_reviews_average_exactly() {
        // ratings 4 and 2 -> mean 3.0 exactly
        let summary = RatingSummary::from_ratings(&[4, 2]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, Decimal::from(3));
    }

    #[test]
    fn repeating_means_round_to_two_places() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, "4.33".parse::<Decimal>().expect("decimal"));
    }

    #[test]
    fn single_review_is_its_own_average() {
        let summary = RatingSummary::from_ratings(&[5]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, Decimal::from(5));
    }
}
