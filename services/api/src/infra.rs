use chrono::NaiveDate;
use evpeti::bookings::{Booking, BookingLifecycle, TransitionPolicy};
use evpeti::listings::{Listing, ListingCatalog};
use evpeti::notifications::{Notification, NotificationDispatcher};
use evpeti::reviews::{RatingAggregator, Review};
use evpeti::storage::MemoryRepository;
use evpeti::users::{User, UserDirectory};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryDispatcher = NotificationDispatcher<MemoryRepository<Notification>>;
pub(crate) type MemoryLifecycle =
    BookingLifecycle<MemoryRepository<Booking>, MemoryRepository<Listing>, MemoryDispatcher>;
pub(crate) type MemoryAggregator =
    RatingAggregator<MemoryRepository<Review>, MemoryRepository<Booking>, MemoryRepository<User>>;

/// Every marketplace service wired over shared in-memory stores.
#[derive(Clone)]
pub(crate) struct Marketplace {
    pub(crate) users: Arc<UserDirectory<MemoryRepository<User>>>,
    pub(crate) listings: Arc<ListingCatalog<MemoryRepository<Listing>>>,
    pub(crate) notifications: Arc<MemoryDispatcher>,
    pub(crate) bookings: Arc<MemoryLifecycle>,
    pub(crate) reviews: Arc<MemoryAggregator>,
}

impl Marketplace {
    pub(crate) fn in_memory(policy: TransitionPolicy) -> Self {
        let user_store = Arc::new(MemoryRepository::<User>::new());
        let listing_store = Arc::new(MemoryRepository::<Listing>::new());
        let booking_store = Arc::new(MemoryRepository::<Booking>::new());
        let notification_store = Arc::new(MemoryRepository::<Notification>::new());
        let review_store = Arc::new(MemoryRepository::<Review>::new());

        let notifications = Arc::new(NotificationDispatcher::new(notification_store));
        let bookings = Arc::new(
            BookingLifecycle::new(
                Arc::clone(&booking_store),
                Arc::clone(&listing_store),
                Arc::clone(&notifications),
            )
            .with_policy(policy),
        );
        let reviews = Arc::new(RatingAggregator::new(
            review_store,
            booking_store,
            Arc::clone(&user_store),
        ));

        Self {
            users: Arc::new(UserDirectory::new(user_store)),
            listings: Arc::new(ListingCatalog::new(listing_store)),
            notifications,
            bookings,
            reviews,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
