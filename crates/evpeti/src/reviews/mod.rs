//! Reviews of completed bookings and the rating aggregation they drive.

pub mod aggregator;
pub mod domain;
pub mod rating;
pub mod router;

#[cfg(test)]
mod tests;

pub use aggregator::{FiledReview, RatingAggregator, Reputation, ReviewError, ReviewViolation};
pub use domain::{NewReview, Review, ReviewFilter, ReviewId};
pub use rating::average_rating;
pub use router::review_router;
