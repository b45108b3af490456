use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::Record;

/// Identifier wrapper for marketplace users (owners and sitters alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile payload accepted by [`super::UserDirectory::register`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Public profile. `rating` and `review_count` are only written by the rating aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    rating: Decimal,
    review_count: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            rating: Decimal::ZERO,
            review_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn rating(&self) -> Decimal {
        self.rating
    }

    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    pub(crate) fn set_reputation(&mut self, rating: Decimal, review_count: u32) {
        self.rating = rating;
        self.review_count = review_count;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    All,
    /// Case-insensitive e-mail match.
    Email(String),
}

impl Record for User {
    type Id = UserId;
    type Filter = UserFilter;

    fn id(&self) -> &UserId {
        &self.id
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        match filter {
            UserFilter::All => true,
            UserFilter::Email(email) => self.email.eq_ignore_ascii_case(email),
        }
    }
}
