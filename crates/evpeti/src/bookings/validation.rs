use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::domain::BookingRequest;
use crate::listings::{Listing, ListingId};

/// Reasons a booking request is refused before anything is persisted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingViolation {
    #[error("booking start date {start} must be before end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("pet name is required")]
    MissingPetName,
    #[error("booking total price must be greater than zero (found {0})")]
    NonPositivePrice(Decimal),
    #[error("booking total price overflows ({nights} nights at {nightly_price})")]
    PriceOverflow { nightly_price: Decimal, nights: i64 },
    #[error("listing {0} does not exist")]
    UnknownListing(ListingId),
    #[error("listing {0} is not open for bookings")]
    ListingUnavailable(ListingId),
}

/// Number of nights covered by the request; zero or negative for malformed ranges.
pub fn nights(request: &BookingRequest) -> i64 {
    (request.end_date - request.start_date).num_days()
}

/// Requested total, or the listing's nightly price times the number of nights.
pub fn derive_total_price(
    request: &BookingRequest,
    listing: &Listing,
) -> Result<Decimal, BookingViolation> {
    if let Some(total_price) = request.total_price {
        return Ok(total_price);
    }
    let nights = nights(request);
    listing
        .price
        .checked_mul(Decimal::from(nights))
        .ok_or(BookingViolation::PriceOverflow {
            nightly_price: listing.price,
            nights,
        })
}

/// Shape checks on a request once its total price is known.
pub fn validate_booking(
    request: &BookingRequest,
    total_price: Decimal,
) -> Result<(), BookingViolation> {
    if request.start_date >= request.end_date {
        return Err(BookingViolation::InvalidDateRange {
            start: request.start_date,
            end: request.end_date,
        });
    }
    if request.pet.name.trim().is_empty() {
        return Err(BookingViolation::MissingPetName);
    }
    if total_price <= Decimal::ZERO {
        return Err(BookingViolation::NonPositivePrice(total_price));
    }
    Ok(())
}
