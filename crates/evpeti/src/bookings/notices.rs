//! Notification copy for booking events.

use std::collections::BTreeMap;

use super::domain::{Booking, BookingStatus};
use crate::notifications::{NotificationDraft, NotificationKind, RelatedType};

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Notice for the sitter that a new request arrived.
pub(crate) fn booking_request(booking: &Booking) -> NotificationDraft {
    let start = booking.start_date.format(DATE_FORMAT).to_string();
    let end = booking.end_date.format(DATE_FORMAT).to_string();

    let extra = BTreeMap::from([
        ("petName".to_string(), booking.pet.name.clone()),
        ("startDate".to_string(), booking.start_date.to_string()),
        ("endDate".to_string(), booking.end_date.to_string()),
        ("totalPrice".to_string(), booking.total_price.to_string()),
    ]);

    NotificationDraft {
        user_id: booking.sitter_id,
        kind: NotificationKind::BookingRequest,
        title: "New booking request".to_string(),
        content: format!(
            "A booking request arrived for {}. Dates: {start} - {end}",
            booking.pet.name
        ),
        related_id: Some(booking.id.0),
        related_type: Some(RelatedType::Booking),
        extra_data: Some(extra),
    }
}

/// Notice for the requester after a decision; `None` for statuses that carry no message.
pub(crate) fn status_change(booking: &Booking, listing_title: &str) -> Option<NotificationDraft> {
    let (kind, title, content) = match booking.status() {
        BookingStatus::Accepted => (
            NotificationKind::BookingAccepted,
            "Booking accepted",
            format!(
                "Your booking request for '{listing_title}' was accepted! You can now contact the sitter."
            ),
        ),
        BookingStatus::Rejected => (
            NotificationKind::BookingRejected,
            "Booking rejected",
            format!("Unfortunately your booking request for '{listing_title}' was rejected."),
        ),
        BookingStatus::Completed => (
            NotificationKind::BookingCompleted,
            "Booking completed",
            format!(
                "Your booking for '{listing_title}' is complete. Don't forget to leave a review!"
            ),
        ),
        BookingStatus::Pending | BookingStatus::Cancelled => return None,
    };

    let extra = BTreeMap::from([
        ("status".to_string(), booking.status().label().to_string()),
        ("listingTitle".to_string(), listing_title.to_string()),
    ]);

    Some(NotificationDraft {
        user_id: booking.requester_id,
        kind,
        title: title.to_string(),
        content,
        related_id: Some(booking.id.0),
        related_type: Some(RelatedType::Booking),
        extra_data: Some(extra),
    })
}

/// Statuses whose arrival is announced to the requester.
pub(crate) fn announces(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::Accepted | BookingStatus::Rejected | BookingStatus::Completed
    )
}
