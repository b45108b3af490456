use rust_decimal::Decimal;

use super::domain::Review;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Arithmetic mean of every rating, rounded to two places. Zero when there are no reviews.
///
/// Depends only on the set of reviews, so any filing order yields the same value.
pub fn average_rating(reviews: &[Review]) -> Decimal {
    if reviews.is_empty() {
        return Decimal::ZERO;
    }
    let total: u64 = reviews.iter().map(|review| u64::from(review.rating)).sum();
    (Decimal::from(total) / Decimal::from(reviews.len() as u64)).round_dp(2)
}
