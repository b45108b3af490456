use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{NewReview, Review, ReviewFilter, ReviewId};
use super::rating::{average_rating, MAX_RATING, MIN_RATING};
use crate::bookings::{Booking, BookingId, BookingStatus};
use crate::clock::{Clock, SystemClock};
use crate::storage::{insert_sequenced, Repository, RepositoryError, Sequence};
use crate::users::{User, UserId};

/// Reviewed user's reputation right after a recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reputation {
    pub id: UserId,
    pub rating: Decimal,
    pub review_count: u32,
}

impl From<&User> for Reputation {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            rating: user.rating(),
            review_count: user.review_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiledReview {
    pub review: Review,
    pub reviewed_user: Reputation,
}

/// Files reviews for completed bookings and keeps each user's `rating` equal to the mean of all
/// reviews they received. The only writer of that attribute.
pub struct RatingAggregator<R, B, U> {
    reviews: Arc<R>,
    bookings: Arc<B>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    sequence: Sequence,
    locks: UserLocks,
}

impl<R, B, U> RatingAggregator<R, B, U>
where
    R: Repository<Review> + 'static,
    B: Repository<Booking> + 'static,
    U: Repository<User> + 'static,
{
    pub fn new(reviews: Arc<R>, bookings: Arc<B>, users: Arc<U>) -> Self {
        Self {
            reviews,
            bookings,
            users,
            clock: Arc::new(SystemClock),
            sequence: Sequence::new(),
            locks: UserLocks::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and persist a review, then recompute the reviewed user's rating.
    ///
    /// The duplicate check, insert, and recompute run under the reviewed user's lock.
    pub fn file_review(&self, submission: NewReview) -> Result<FiledReview, ReviewError> {
        if !(MIN_RATING..=MAX_RATING).contains(&submission.rating) {
            return Err(ReviewViolation::RatingOutOfRange(submission.rating).into());
        }

        let booking = self
            .bookings
            .fetch(&submission.booking_id)?
            .ok_or(ReviewError::BookingNotFound(submission.booking_id))?;
        if booking.status() != BookingStatus::Completed {
            return Err(ReviewViolation::BookingNotCompleted {
                booking_id: booking.id,
                status: booking.status(),
            }
            .into());
        }
        match booking.counterparty(submission.reviewer_id) {
            None => {
                return Err(ReviewViolation::NotAParty {
                    booking_id: booking.id,
                    user_id: submission.reviewer_id,
                }
                .into())
            }
            Some(expected) if expected != submission.reviewed_user_id => {
                return Err(ReviewViolation::WrongReviewedUser {
                    expected,
                    found: submission.reviewed_user_id,
                }
                .into())
            }
            Some(_) => {}
        }

        let reviewed_id = submission.reviewed_user_id;
        if self.users.fetch(&reviewed_id)?.is_none() {
            return Err(ReviewError::UserNotFound(reviewed_id));
        }

        let lock = self.locks.for_user(reviewed_id)?;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let filter = ReviewFilter::BookingAndReviewer(submission.booking_id, submission.reviewer_id);
        if !self.reviews.query(&filter)?.is_empty() {
            return Err(ReviewViolation::Duplicate {
                booking_id: submission.booking_id,
                reviewer_id: submission.reviewer_id,
            }
            .into());
        }

        let created_at = self.clock.now();
        let review = insert_sequenced(self.reviews.as_ref(), &self.sequence, |id| {
            Review::from_submission(ReviewId(id), submission.clone(), created_at)
        })?;
        info!(
            review_id = %review.id,
            booking_id = %review.booking_id,
            user_id = %reviewed_id,
            rating = review.rating,
            "review filed"
        );

        let reviewed = match self.on_review_filed(&review) {
            Ok(reviewed) => reviewed,
            Err(err) => {
                // The review row must not outlive a failed recompute.
                warn!(
                    review_id = %review.id,
                    error = %err,
                    "rating recompute failed; withdrawing review"
                );
                if let Err(remove_err) = self.reviews.remove(&review.id) {
                    error!(
                        review_id = %review.id,
                        error = %remove_err,
                        "failed to withdraw review"
                    );
                }
                return Err(err);
            }
        };
        Ok(FiledReview {
            review,
            reviewed_user: Reputation::from(&reviewed),
        })
    }

    /// Recompute the rating of the user `review` was filed against. Callers hold that user's lock.
    fn on_review_filed(&self, review: &Review) -> Result<User, ReviewError> {
        self.recompute_unlocked(review.reviewed_user_id)
    }

    /// Recompute a user's rating from every review they have received.
    ///
    /// Idempotent: running it again over the same reviews stores the same value.
    pub fn recompute(&self, user_id: UserId) -> Result<Reputation, ReviewError> {
        let lock = self.locks.for_user(user_id)?;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let user = self.recompute_unlocked(user_id)?;
        Ok(Reputation::from(&user))
    }

    fn recompute_unlocked(&self, user_id: UserId) -> Result<User, ReviewError> {
        let received = self.reviews.query(&ReviewFilter::Reviewed(user_id))?;
        let rating = average_rating(&received);
        let review_count = u32::try_from(received.len()).unwrap_or(u32::MAX);

        let mut user = self
            .users
            .fetch(&user_id)?
            .ok_or(ReviewError::UserNotFound(user_id))?;
        user.set_reputation(rating, review_count);
        self.users.update(user.clone())?;

        info!(user_id = %user_id, %rating, review_count, "user rating recomputed");
        Ok(user)
    }

    /// Reviews a user received, newest first.
    pub fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>, ReviewError> {
        self.query_newest_first(&ReviewFilter::Reviewed(user_id))
    }

    pub fn reviews_for_booking(&self, booking_id: BookingId) -> Result<Vec<Review>, ReviewError> {
        self.query_newest_first(&ReviewFilter::Booking(booking_id))
    }

    fn query_newest_first(&self, filter: &ReviewFilter) -> Result<Vec<Review>, ReviewError> {
        let mut reviews = self.reviews.query(filter)?;
        reviews.sort_by_key(|review| Reverse((review.created_at, review.id)));
        Ok(reviews)
    }
}

/// One mutex per reviewed user, created on first use.
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user_id: UserId) -> Result<Arc<Mutex<()>>, ReviewError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| RepositoryError::Unavailable("rating lock table poisoned".to_string()))?;
        Ok(Arc::clone(locks.entry(user_id).or_default()))
    }
}

/// Reasons a review is refused. Nothing is persisted when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewViolation {
    #[error("rating must be between 1 and 5 (found {0})")]
    RatingOutOfRange(u8),
    #[error("booking {booking_id} is {status}; reviews require a completed booking")]
    BookingNotCompleted {
        booking_id: BookingId,
        status: BookingStatus,
    },
    #[error("user {user_id} is not a party to booking {booking_id}")]
    NotAParty { booking_id: BookingId, user_id: UserId },
    #[error("review must be about user {expected}, not user {found}")]
    WrongReviewedUser { expected: UserId, found: UserId },
    #[error("user {reviewer_id} already reviewed booking {booking_id}")]
    Duplicate {
        booking_id: BookingId,
        reviewer_id: UserId,
    },
}

/// Error raised by the rating aggregator.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Invalid(#[from] ReviewViolation),
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
