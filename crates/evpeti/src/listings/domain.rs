use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::Record;
use crate::users::UserId;

/// Identifier wrapper for sitter listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingId(pub u64);

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label used in copy when a listing has no usable title.
pub const UNTITLED_LISTING: &str = "Listing";

fn default_true() -> bool {
    true
}

/// Listing fields as proposed by a sitter, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub owner_id: UserId,
    #[serde(default)]
    pub title: Option<String>,
    /// Kind of care offered (e.g. "Dog walking", "Boarding").
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub price: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ListingUpdate {
    pub(crate) fn apply_to(self, draft: &mut ListingDraft) {
        if let Some(title) = self.title {
            draft.title = Some(title);
        }
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(start_date) = self.start_date {
            draft.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            draft.end_date = end_date;
        }
        if let Some(description) = self.description {
            draft.description = Some(description);
        }
        if let Some(is_available) = self.is_available {
            draft.is_available = is_available;
        }
        if let Some(is_active) = self.is_active {
            draft.is_active = is_active;
        }
    }
}

/// A sitter's published offer. Owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub price: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
    pub is_available: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn from_draft(id: ListingId, draft: ListingDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: draft.owner_id,
            title: draft.title,
            kind: draft.kind,
            location: draft.location,
            price: draft.price,
            start_date: draft.start_date,
            end_date: draft.end_date,
            description: draft.description,
            is_available: draft.is_available,
            is_active: draft.is_active,
            created_at,
        }
    }

    pub fn to_draft(&self) -> ListingDraft {
        ListingDraft {
            owner_id: self.owner_id,
            title: self.title.clone(),
            kind: self.kind.clone(),
            location: self.location.clone(),
            price: self.price,
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description.clone(),
            is_available: self.is_available,
            is_active: self.is_active,
        }
    }

    /// Listing title for user-facing copy, falling back to a generic label.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_LISTING)
    }

    /// Open to new booking requests.
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_available
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFilter {
    All,
    Owner(UserId),
    /// Active and available listings.
    Active,
}

impl Record for Listing {
    type Id = ListingId;
    type Filter = ListingFilter;

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn matches(&self, filter: &ListingFilter) -> bool {
        match filter {
            ListingFilter::All => true,
            ListingFilter::Owner(owner_id) => self.owner_id == *owner_id,
            ListingFilter::Active => self.is_bookable(),
        }
    }
}
