use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    Booking, BookingFilter, BookingId, BookingRequest, BookingStatus, TransitionPolicy,
    UnknownStatus,
};
use super::notices;
use super::validation::{derive_total_price, validate_booking, BookingViolation};
use crate::clock::{Clock, SystemClock};
use crate::listings::{Listing, ListingFilter, ListingId, UNTITLED_LISTING};
use crate::notifications::{NotificationDraft, NotificationId, NotificationSink};
use crate::storage::{insert_sequenced, Repository, RepositoryError, Sequence};
use crate::users::UserId;

/// What happened to the notification a booking operation triggered.
///
/// Never affects whether the booking operation itself succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Delivered(NotificationId),
    /// The transition has no notice attached.
    Skipped,
    Failed(String),
}

/// Booking as persisted plus the outcome of its notification side effect.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub notification: Dispatch,
}

/// Owns the booking state machine and the notices each step sends.
///
/// Storage writes and notification delivery are deliberately separate steps: once the booking
/// write succeeds the operation succeeds, whatever the sink reports.
pub struct BookingLifecycle<B, L, S> {
    bookings: Arc<B>,
    listings: Arc<L>,
    notifications: Arc<S>,
    policy: TransitionPolicy,
    clock: Arc<dyn Clock>,
    sequence: Sequence,
}

impl<B, L, S> BookingLifecycle<B, L, S>
where
    B: Repository<Booking> + 'static,
    L: Repository<Listing> + 'static,
    S: NotificationSink + 'static,
{
    pub fn new(bookings: Arc<B>, listings: Arc<L>, notifications: Arc<S>) -> Self {
        Self {
            bookings,
            listings,
            notifications,
            policy: TransitionPolicy::default(),
            clock: Arc::new(SystemClock),
            sequence: Sequence::new(),
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Validate and persist a `Pending` booking, then tell the listing owner about it.
    pub fn create_booking(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        let listing = self
            .listings
            .fetch(&request.listing_id)?
            .ok_or(BookingViolation::UnknownListing(request.listing_id))?;
        if !listing.is_bookable() {
            return Err(BookingViolation::ListingUnavailable(listing.id).into());
        }

        let total_price = derive_total_price(&request, &listing)?;
        validate_booking(&request, total_price)?;

        let created_at = self.clock.now();
        let booking = insert_sequenced(self.bookings.as_ref(), &self.sequence, |id| {
            Booking::pending(
                BookingId(id),
                request.clone(),
                listing.owner_id,
                total_price,
                created_at,
            )
        })?;
        info!(
            booking_id = %booking.id,
            listing_id = %booking.listing_id,
            requester_id = %booking.requester_id,
            "booking created"
        );

        let notification = self.deliver(booking.id, Some(notices::booking_request(&booking)));
        Ok(BookingOutcome {
            booking,
            notification,
        })
    }

    /// Move a booking along the transition table and notify the requester of decisions.
    pub fn update_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<BookingOutcome, BookingError> {
        let current = self.get_booking(booking_id)?;
        if !self.policy.allows(current.status(), status) {
            return Err(BookingError::IllegalTransition {
                from: current.status(),
                to: status,
            });
        }

        let booking = current.transition(status, self.clock.now());
        match self.bookings.update(booking.clone()) {
            Ok(()) => {}
            Err(RepositoryError::StaleRevision) => {
                return Err(BookingError::ConcurrentUpdate(booking_id))
            }
            Err(RepositoryError::NotFound) => return Err(BookingError::NotFound(booking_id)),
            Err(err) => return Err(err.into()),
        }
        info!(
            booking_id = %booking_id,
            from = current.status().label(),
            to = status.label(),
            "booking status updated"
        );

        let notice = if notices::announces(status) {
            notices::status_change(&booking, &self.listing_title(booking.listing_id))
        } else {
            None
        };
        let notification = self.deliver(booking_id, notice);
        Ok(BookingOutcome {
            booking,
            notification,
        })
    }

    /// Parse a wire status literal and apply it.
    pub fn update_status_label(
        &self,
        booking_id: BookingId,
        status: &str,
    ) -> Result<BookingOutcome, BookingError> {
        let status = status.parse::<BookingStatus>()?;
        self.update_status(booking_id, status)
    }

    pub fn get_booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .fetch(&booking_id)?
            .ok_or(BookingError::NotFound(booking_id))
    }

    /// Bookings the user requested, newest first.
    pub fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, BookingError> {
        self.query_newest_first(&BookingFilter::Requester(user_id))
    }

    pub fn bookings_for_listing(&self, listing_id: ListingId) -> Result<Vec<Booking>, BookingError> {
        self.query_newest_first(&BookingFilter::Listing(listing_id))
    }

    /// Requests across every listing the user owns, newest first.
    pub fn bookings_for_listing_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Booking>, BookingError> {
        let listing_ids: Vec<ListingId> = self
            .listings
            .query(&ListingFilter::Owner(owner_id))?
            .into_iter()
            .map(|listing| listing.id)
            .collect();
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_newest_first(&BookingFilter::Listings(listing_ids))
    }

    fn query_newest_first(&self, filter: &BookingFilter) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = self.bookings.query(filter)?;
        bookings.sort_by_key(|booking| Reverse((booking.created_at, booking.id)));
        Ok(bookings)
    }

    fn listing_title(&self, listing_id: ListingId) -> String {
        match self.listings.fetch(&listing_id) {
            Ok(Some(listing)) => listing.display_title().to_string(),
            Ok(None) => UNTITLED_LISTING.to_string(),
            Err(err) => {
                warn!(listing_id = %listing_id, error = %err, "listing lookup for notice failed");
                UNTITLED_LISTING.to_string()
            }
        }
    }

    fn deliver(&self, booking_id: BookingId, notice: Option<NotificationDraft>) -> Dispatch {
        let Some(draft) = notice else {
            return Dispatch::Skipped;
        };
        let recipient = draft.user_id;
        let kind = draft.kind.label();

        match self.notifications.notify(draft) {
            Ok(notification) => Dispatch::Delivered(notification.id),
            Err(err) => {
                warn!(
                    booking_id = %booking_id,
                    user_id = %recipient,
                    kind,
                    error = %err,
                    "booking notification failed"
                );
                Dispatch::Failed(err.to_string())
            }
        }
    }
}

/// Error raised by the booking lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Invalid(#[from] BookingViolation),
    #[error("booking {0} not found")]
    NotFound(BookingId),
    #[error("booking cannot move from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("booking {0} was changed by another request; reload and retry")]
    ConcurrentUpdate(BookingId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
