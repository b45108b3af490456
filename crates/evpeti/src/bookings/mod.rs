//! Booking lifecycle engine: request validation, the status state machine, and the
//! owner/requester notices each step sends.

pub mod domain;
pub mod lifecycle;
mod notices;
pub mod router;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Booking, BookingFilter, BookingId, BookingRequest, BookingStatus, PetDescriptor,
    TransitionPolicy, UnknownStatus,
};
pub use lifecycle::{BookingError, BookingLifecycle, BookingOutcome, Dispatch};
pub use router::{booking_router, StatusChange};
pub use validation::{derive_total_price, nights, validate_booking, BookingViolation};
