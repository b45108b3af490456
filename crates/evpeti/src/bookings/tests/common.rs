use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::bookings::domain::{
    Booking, BookingFilter, BookingId, BookingRequest, BookingStatus, PetDescriptor,
};
use crate::bookings::BookingLifecycle;
use crate::clock::Clock;
use crate::listings::{Listing, ListingDraft, ListingId};
use crate::notifications::{
    Notification, NotificationDispatcher, NotificationDraft, NotificationError, NotificationSink,
};
use crate::storage::{MemoryRepository, Repository, RepositoryError};
use crate::users::UserId;

pub(super) type MemoryLifecycle = BookingLifecycle<
    MemoryRepository<Booking>,
    MemoryRepository<Listing>,
    NotificationDispatcher<MemoryRepository<Notification>>,
>;

/// Clock that advances one minute per reading so creation order is observable.
pub(super) struct StepClock {
    next: Mutex<DateTime<Utc>>,
}

impl Default for StepClock {
    fn default() -> Self {
        Self {
            next: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let mut guard = self.next.lock().expect("clock mutex poisoned");
        let now = *guard;
        *guard = now + Duration::minutes(1);
        now
    }
}

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

pub(super) fn listing(id: u64, owner: u64, title: Option<&str>) -> Listing {
    Listing::from_draft(
        ListingId(id),
        ListingDraft {
            owner_id: UserId(owner),
            title: title.map(str::to_string),
            kind: "Boarding".to_string(),
            location: format!("District {id}"),
            price: Decimal::new(50, 0),
            start_date: date(1, 1),
            end_date: date(12, 31),
            description: None,
            is_available: true,
            is_active: true,
        },
        Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
    )
}

pub(super) fn request(requester: u64, listing: u64) -> BookingRequest {
    BookingRequest {
        requester_id: UserId(requester),
        listing_id: ListingId(listing),
        start_date: date(1, 1),
        end_date: date(1, 5),
        pet: PetDescriptor {
            name: "Karabas".to_string(),
            kind: Some("Dog".to_string()),
            age: Some(4),
            pet_id: None,
        },
        total_price: Some(Decimal::new(200, 0)),
        notes: Some("Needs two walks a day".to_string()),
        contact_phone: None,
        contact_email: Some("owner@example.com".to_string()),
    }
}

pub(super) struct Harness {
    pub(super) bookings: MemoryRepository<Booking>,
    pub(super) listings: MemoryRepository<Listing>,
    pub(super) notifications: MemoryRepository<Notification>,
    pub(super) lifecycle: MemoryLifecycle,
}

/// Lifecycle over in-memory stores with listing 10 (owner 2, "Sunny flat") and listing 11
/// (owner 2, untitled) seeded.
pub(super) fn harness() -> Harness {
    let bookings = MemoryRepository::new();
    let listings = MemoryRepository::seeded([
        listing(10, 2, Some("Sunny flat")),
        listing(11, 2, None),
        listing(20, 3, Some("Garden house")),
    ]);
    let notifications = MemoryRepository::new();
    let clock: Arc<dyn Clock> = Arc::new(StepClock::default());

    let dispatcher = NotificationDispatcher::new(Arc::new(notifications.clone()))
        .with_clock(Arc::clone(&clock));
    let lifecycle = BookingLifecycle::new(
        Arc::new(bookings.clone()),
        Arc::new(listings.clone()),
        Arc::new(dispatcher),
    )
    .with_clock(clock);

    Harness {
        bookings,
        listings,
        notifications,
        lifecycle,
    }
}

pub(super) fn notifications_for(
    notifications: &MemoryRepository<Notification>,
    user: u64,
) -> Vec<Notification> {
    notifications
        .query(&crate::notifications::NotificationFilter::Recipient(UserId(user)))
        .expect("query notifications")
}

/// Sink whose transport is always down.
#[derive(Default)]
pub(super) struct FailingSink;

impl NotificationSink for FailingSink {
    fn notify(&self, _draft: NotificationDraft) -> Result<Notification, NotificationError> {
        Err(NotificationError::Repository(RepositoryError::Unavailable(
            "notification store offline".to_string(),
        )))
    }
}

/// Booking store where another request wins the race between every read and the following
/// write: each fetch hands out the current record after a competing transition was stored.
pub(super) struct RacingRepository {
    pub(super) inner: MemoryRepository<Booking>,
    pub(super) competing: BookingStatus,
}

impl Repository<Booking> for RacingRepository {
    fn insert(&self, record: Booking) -> Result<Booking, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: Booking) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn update_batch(&self, records: Vec<Booking>) -> Result<(), RepositoryError> {
        self.inner.update_batch(records)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let snapshot = self.inner.fetch(id)?;
        if let Some(stored) = &snapshot {
            self.inner
                .update(stored.transition(self.competing, Utc::now()))?;
        }
        Ok(snapshot)
    }

    fn query(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        self.inner.query(filter)
    }

    fn remove(&self, id: &BookingId) -> Result<Booking, RepositoryError> {
        self.inner.remove(id)
    }
}

/// Store that rejects every call, standing in for an unreachable database.
pub(super) struct UnavailableRepository;

impl Repository<Booking> for UnavailableRepository {
    fn insert(&self, _record: Booking) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: Booking) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_batch(&self, _records: Vec<Booking>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn query(&self, _filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &BookingId) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
