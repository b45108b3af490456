use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bookings::BookingId;
use crate::storage::Record;
use crate::users::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub u64);

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review as submitted by one party of a completed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub booking_id: BookingId,
    pub reviewer_id: UserId,
    pub reviewed_user_id: UserId,
    /// Whole stars, 1 through 5.
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Stored review. Never changes after it is filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub reviewer_id: UserId,
    pub reviewed_user_id: UserId,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn from_submission(id: ReviewId, submission: NewReview, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            booking_id: submission.booking_id,
            reviewer_id: submission.reviewer_id,
            reviewed_user_id: submission.reviewed_user_id,
            rating: submission.rating,
            comment: submission.comment,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
    /// Reviews received by a user.
    Reviewed(UserId),
    Booking(BookingId),
    BookingAndReviewer(BookingId, UserId),
}

impl Record for Review {
    type Id = ReviewId;
    type Filter = ReviewFilter;

    fn id(&self) -> &ReviewId {
        &self.id
    }

    fn matches(&self, filter: &ReviewFilter) -> bool {
        match filter {
            ReviewFilter::Reviewed(user_id) => self.reviewed_user_id == *user_id,
            ReviewFilter::Booking(booking_id) => self.booking_id == *booking_id,
            ReviewFilter::BookingAndReviewer(booking_id, reviewer_id) => {
                self.booking_id == *booking_id && self.reviewer_id == *reviewer_id
            }
        }
    }
}
