//! Sitter listings: the read dependency booking creation resolves recipients through, plus the
//! minimal catalog operations around it.

pub mod catalog;
pub mod domain;
pub mod import;
pub mod router;
pub mod validation;

pub use catalog::{ListingCatalog, ListingError};
pub use domain::{
    Listing, ListingDraft, ListingFilter, ListingId, ListingUpdate, UNTITLED_LISTING,
};
pub use import::{ImportReport, ListingImportError, ListingImporter, RejectedRow};
pub use router::listing_router;
pub use validation::{ensure_unique, validate_listing, ListingViolation};
