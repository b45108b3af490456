//! Minimal user profile boundary.
//!
//! Registration and authentication live elsewhere; this module only carries the profile fields
//! the marketplace core reads and the `rating` attribute owned by
//! [`crate::reviews::RatingAggregator`].

pub mod directory;
pub mod domain;
pub mod router;

pub use directory::{UserDirectory, UserError};
pub use domain::{NewUser, User, UserFilter, UserId};
pub use router::user_router;
