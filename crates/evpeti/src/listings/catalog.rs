use std::cmp::Reverse;
use std::sync::Arc;

use tracing::info;

use super::domain::{Listing, ListingDraft, ListingFilter, ListingId, ListingUpdate};
use super::validation::{ensure_unique, validate_listing, ListingViolation};
use crate::clock::{Clock, SystemClock};
use crate::storage::{insert_sequenced, Repository, RepositoryError, Sequence};
use crate::users::UserId;

/// CRUD and active-listing queries over sitter listings.
pub struct ListingCatalog<L> {
    listings: Arc<L>,
    clock: Arc<dyn Clock>,
    sequence: Sequence,
}

impl<L> ListingCatalog<L>
where
    L: Repository<Listing> + 'static,
{
    pub fn new(listings: Arc<L>) -> Self {
        Self {
            listings,
            clock: Arc::new(SystemClock),
            sequence: Sequence::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and persist a new listing.
    pub fn create(&self, draft: ListingDraft) -> Result<Listing, ListingError> {
        validate_listing(&draft)?;
        let owned = self.listings.query(&ListingFilter::Owner(draft.owner_id))?;
        ensure_unique(&draft, &owned, None)?;

        let created_at = self.clock.now();
        let listing = insert_sequenced(self.listings.as_ref(), &self.sequence, |id| {
            Listing::from_draft(ListingId(id), draft.clone(), created_at)
        })?;

        info!(listing_id = %listing.id, owner_id = %listing.owner_id, "listing created");
        Ok(listing)
    }

    pub fn get(&self, listing_id: ListingId) -> Result<Listing, ListingError> {
        self.listings
            .fetch(&listing_id)?
            .ok_or(ListingError::NotFound(listing_id))
    }

    /// Apply a partial update; the merged listing is re-validated before it is stored.
    pub fn update(
        &self,
        listing_id: ListingId,
        update: ListingUpdate,
    ) -> Result<Listing, ListingError> {
        let stored = self.get(listing_id)?;
        let mut draft = stored.to_draft();
        update.apply_to(&mut draft);

        validate_listing(&draft)?;
        let owned = self.listings.query(&ListingFilter::Owner(draft.owner_id))?;
        ensure_unique(&draft, &owned, Some(listing_id))?;

        let listing = Listing::from_draft(listing_id, draft, stored.created_at);
        self.listings.update(listing.clone())?;
        Ok(listing)
    }

    pub fn delete(&self, listing_id: ListingId) -> Result<Listing, ListingError> {
        match self.listings.remove(&listing_id) {
            Ok(listing) => {
                info!(listing_id = %listing_id, "listing deleted");
                Ok(listing)
            }
            Err(RepositoryError::NotFound) => Err(ListingError::NotFound(listing_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Every listing owned by `owner_id`, newest first.
    pub fn listings_for_owner(&self, owner_id: UserId) -> Result<Vec<Listing>, ListingError> {
        self.query_newest_first(&ListingFilter::Owner(owner_id))
    }

    /// Listings currently open to booking requests, newest first.
    pub fn active_listings(&self) -> Result<Vec<Listing>, ListingError> {
        self.query_newest_first(&ListingFilter::Active)
    }

    fn query_newest_first(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ListingError> {
        let mut listings = self.listings.query(filter)?;
        listings.sort_by_key(|listing| Reverse((listing.created_at, listing.id)));
        Ok(listings)
    }
}

/// Error raised by the listing catalog.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error(transparent)]
    Invalid(#[from] ListingViolation),
    #[error("listing {0} not found")]
    NotFound(ListingId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
