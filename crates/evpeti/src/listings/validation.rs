use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::domain::{Listing, ListingDraft, ListingId};

/// Reasons a proposed listing is refused before persistence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingViolation {
    #[error("listing type is required")]
    MissingType,
    #[error("listing location is required")]
    MissingLocation,
    #[error("listing price '{0}' is not a number")]
    UnparseablePrice(String),
    #[error("listing price must be greater than zero (found {0})")]
    NonPositivePrice(Decimal),
    #[error("listing start date {start} must be before end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("listing must belong to a valid user")]
    MissingOwner,
    #[error("listing with type '{kind}' and location '{location}' already exists for this user")]
    Duplicate { kind: String, location: String },
}

/// Shape checks shared by create and update.
pub fn validate_listing(draft: &ListingDraft) -> Result<(), ListingViolation> {
    if draft.kind.trim().is_empty() {
        return Err(ListingViolation::MissingType);
    }
    if draft.location.trim().is_empty() {
        return Err(ListingViolation::MissingLocation);
    }
    if draft.price <= Decimal::ZERO {
        return Err(ListingViolation::NonPositivePrice(draft.price));
    }
    if draft.start_date >= draft.end_date {
        return Err(ListingViolation::InvalidDateRange {
            start: draft.start_date,
            end: draft.end_date,
        });
    }
    if draft.owner_id.0 == 0 {
        return Err(ListingViolation::MissingOwner);
    }
    Ok(())
}

/// Reject a draft whose (type, location) pair, compared case-insensitively, matches another
/// listing of the same owner. `exclude` skips the listing being edited.
pub fn ensure_unique(
    draft: &ListingDraft,
    existing: &[Listing],
    exclude: Option<ListingId>,
) -> Result<(), ListingViolation> {
    let kind = draft.kind.trim().to_lowercase();
    let location = draft.location.trim().to_lowercase();

    let duplicate = existing
        .iter()
        .filter(|listing| listing.owner_id == draft.owner_id)
        .filter(|listing| Some(listing.id) != exclude)
        .any(|listing| {
            listing.kind.trim().to_lowercase() == kind
                && listing.location.trim().to_lowercase() == location
        });

    if duplicate {
        return Err(ListingViolation::Duplicate {
            kind: draft.kind.clone(),
            location: draft.location.clone(),
        });
    }
    Ok(())
}
