use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::listings::ListingId;
use crate::storage::Record;
use crate::users::UserId;

/// Identifier wrapper for bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Booking status. The variant names are the wire values and are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(BookingStatus::Pending),
            "Accepted" => Ok(BookingStatus::Accepted),
            "Rejected" => Ok(BookingStatus::Rejected),
            "Completed" => Ok(BookingStatus::Completed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Which status edges are legal.
///
/// ```text
/// Pending  -> Accepted | Rejected | Cancelled
/// Accepted -> Completed | Cancelled (when allowed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPolicy {
    pub allow_accepted_cancellation: bool,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            allow_accepted_cancellation: true,
        }
    }
}

impl TransitionPolicy {
    pub fn allows(&self, from: BookingStatus, to: BookingStatus) -> bool {
        use BookingStatus::*;
        match (from, to) {
            (Pending, Accepted) | (Pending, Rejected) | (Pending, Cancelled) => true,
            (Accepted, Completed) => true,
            (Accepted, Cancelled) => self.allow_accepted_cancellation,
            _ => false,
        }
    }
}

/// The animal a booking is for. Only the name is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetDescriptor {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub pet_id: Option<u64>,
}

/// Payload a requester submits to open a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub requester_id: UserId,
    pub listing_id: ListingId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pet: PetDescriptor,
    /// Derived from the listing's nightly price when omitted.
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

/// Persisted booking. Status and its timestamps only change through a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub requester_id: UserId,
    pub listing_id: ListingId,
    /// Owner of the listing when the booking was made.
    pub sitter_id: UserId,
    pub pet: PetDescriptor,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    status: BookingStatus,
    pub created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    revision: u64,
}

impl Booking {
    pub fn pending(
        id: BookingId,
        request: BookingRequest,
        sitter_id: UserId,
        total_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            requester_id: request.requester_id,
            listing_id: request.listing_id,
            sitter_id,
            pet: request.pet,
            start_date: request.start_date,
            end_date: request.end_date,
            total_price,
            notes: request.notes,
            contact_phone: request.contact_phone,
            contact_email: request.contact_email,
            status: BookingStatus::Pending,
            created_at,
            updated_at: None,
            accepted_at: None,
            rejected_at: None,
            revision: 0,
        }
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when `user_id` is the requester or the sitter.
    pub fn involves(&self, user_id: UserId) -> bool {
        self.requester_id == user_id || self.sitter_id == user_id
    }

    /// The party on the other side of `user_id`, if `user_id` is a party at all.
    pub fn counterparty(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.requester_id {
            Some(self.sitter_id)
        } else if user_id == self.sitter_id {
            Some(self.requester_id)
        } else {
            None
        }
    }

    /// Copy with the new status applied, stamps set, and the revision bumped.
    pub(crate) fn transition(&self, to: BookingStatus, at: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = to;
        next.updated_at = Some(at);
        match to {
            BookingStatus::Accepted => next.accepted_at = Some(at),
            BookingStatus::Rejected => next.rejected_at = Some(at),
            _ => {}
        }
        next.revision = self.revision + 1;
        next
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingFilter {
    Requester(UserId),
    Listing(ListingId),
    /// Any of the given listings; used for the sitter inbox.
    Listings(Vec<ListingId>),
}

impl Record for Booking {
    type Id = BookingId;
    type Filter = BookingFilter;

    fn id(&self) -> &BookingId {
        &self.id
    }

    fn matches(&self, filter: &BookingFilter) -> bool {
        match filter {
            BookingFilter::Requester(user_id) => self.requester_id == *user_id,
            BookingFilter::Listing(listing_id) => self.listing_id == *listing_id,
            BookingFilter::Listings(listing_ids) => listing_ids.contains(&self.listing_id),
        }
    }

    fn revision(&self) -> Option<u64> {
        Some(self.revision)
    }
}
