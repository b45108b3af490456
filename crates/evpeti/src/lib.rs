//! Core of the EvPeti pet-sitting marketplace: booking lifecycle, notifications, reviews, and
//! rating aggregation over a generic storage interface, with axum routers per domain.

pub mod bookings;
pub mod clock;
pub mod config;
pub mod error;
pub mod listings;
pub mod notifications;
pub mod reviews;
pub mod storage;
pub mod telemetry;
pub mod users;

pub use error::AppError;
