use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tower::ServiceExt;

use super::*;
use crate::bookings::{Booking, BookingId, BookingRequest, BookingStatus, PetDescriptor};
use crate::listings::ListingId;
use crate::storage::{MemoryRepository, Repository, RepositoryError};
use crate::users::UserFilter;
use std::sync::atomic::{AtomicBool, Ordering};
use crate::users::{User, UserId};

type MemoryAggregator =
    RatingAggregator<MemoryRepository<Review>, MemoryRepository<Booking>, MemoryRepository<User>>;

fn booking(id: u64, requester: u64, sitter: u64, status: BookingStatus) -> Booking {
    let request = BookingRequest {
        requester_id: UserId(requester),
        listing_id: ListingId(10),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid"),
        end_date: NaiveDate::from_ymd_opt(2025, 1, 5).expect("valid"),
        pet: PetDescriptor {
            name: "Duman".to_string(),
            kind: None,
            age: None,
            pet_id: None,
        },
        total_price: Some(dec!(200)),
        notes: None,
        contact_phone: None,
        contact_email: None,
    };
    let pending = Booking::pending(BookingId(id), request, UserId(sitter), dec!(200), Utc::now());
    match status {
        BookingStatus::Pending => pending,
        BookingStatus::Completed => pending
            .transition(BookingStatus::Accepted, Utc::now())
            .transition(BookingStatus::Completed, Utc::now()),
        other => pending.transition(other, Utc::now()),
    }
}

struct Fixture {
    users: MemoryRepository<User>,
    reviews: MemoryRepository<Review>,
    aggregator: MemoryAggregator,
}

/// Users 1, 2, 4, 5, 6; bookings 1..=3 completed between requesters 1/4/5 and sitter 2,
/// booking 9 still pending.
fn fixture() -> Fixture {
    let users = MemoryRepository::seeded(
        [(1, "Ali"), (2, "Zeynep"), (4, "Can"), (5, "Ece"), (6, "Deniz")]
            .into_iter()
            .map(|(id, name)| User::new(UserId(id), name, format!("{}@example.com", name))),
    );
    let bookings = MemoryRepository::seeded([
        booking(1, 1, 2, BookingStatus::Completed),
        booking(2, 4, 2, BookingStatus::Completed),
        booking(3, 5, 2, BookingStatus::Completed),
        booking(9, 1, 2, BookingStatus::Pending),
    ]);
    let reviews = MemoryRepository::new();
    let aggregator = RatingAggregator::new(
        Arc::new(reviews.clone()),
        Arc::new(bookings),
        Arc::new(users.clone()),
    );
    Fixture {
        users,
        reviews,
        aggregator,
    }
}

fn submission(booking: u64, reviewer: u64, reviewed: u64, rating: u8) -> NewReview {
    NewReview {
        booking_id: BookingId(booking),
        reviewer_id: UserId(reviewer),
        reviewed_user_id: UserId(reviewed),
        rating,
        comment: Some("Lovely stay".to_string()),
    }
}

fn stored_rating(users: &MemoryRepository<User>, id: u64) -> (Decimal, u32) {
    let user = users
        .fetch(&UserId(id))
        .expect("fetch user")
        .expect("user exists");
    (user.rating(), user.review_count())
}

#[test]
fn first_review_sets_rating() {
    let fixture = fixture();
    let filed = fixture
        .aggregator
        .file_review(submission(1, 1, 2, 5))
        .expect("review filed");

    assert_eq!(filed.review.rating, 5);
    assert_eq!(filed.reviewed_user.rating, dec!(5.0));
    assert_eq!(filed.reviewed_user.review_count, 1);
    assert_eq!(stored_rating(&fixture.users, 2), (dec!(5), 1));
}

#[test]
fn rating_is_mean_of_all_reviews_in_any_order() {
    let orders: [[(u64, u64, u8); 3]; 3] = [
        [(1, 1, 5), (2, 4, 3), (3, 5, 4)],
        [(3, 5, 4), (1, 1, 5), (2, 4, 3)],
        [(2, 4, 3), (3, 5, 4), (1, 1, 5)],
    ];
    for order in orders {
        let fixture = fixture();
        for (booking, reviewer, rating) in order {
            fixture
                .aggregator
                .file_review(submission(booking, reviewer, 2, rating))
                .expect("review filed");
        }
        assert_eq!(stored_rating(&fixture.users, 2), (dec!(4.0), 3));
    }
}

#[test]
fn second_review_for_same_booking_and_reviewer_is_rejected() {
    let fixture = fixture();
    fixture
        .aggregator
        .file_review(submission(1, 1, 2, 5))
        .expect("first review");

    match fixture.aggregator.file_review(submission(1, 1, 2, 1)) {
        Err(ReviewError::Invalid(ReviewViolation::Duplicate { .. })) => {}
        other => panic!("expected duplicate violation, got {other:?}"),
    }
    assert_eq!(fixture.reviews.len(), 1);
    assert_eq!(stored_rating(&fixture.users, 2), (dec!(5), 1));

    fixture
        .aggregator
        .file_review(submission(1, 2, 1, 4))
        .expect("the other party may still review");
}

#[test]
fn review_requires_completed_booking() {
    let fixture = fixture();
    match fixture.aggregator.file_review(submission(9, 1, 2, 5)) {
        Err(ReviewError::Invalid(ReviewViolation::BookingNotCompleted { status, .. })) => {
            assert_eq!(status, BookingStatus::Pending);
        }
        other => panic!("expected not completed, got {other:?}"),
    }
    assert!(fixture.reviews.is_empty());
    assert_eq!(stored_rating(&fixture.users, 2), (Decimal::ZERO, 0));
}

#[test]
fn review_rejects_bad_rating_and_outsiders() {
    let fixture = fixture();
    for rating in [0, 6] {
        assert!(matches!(
            fixture.aggregator.file_review(submission(1, 1, 2, rating)),
            Err(ReviewError::Invalid(ReviewViolation::RatingOutOfRange(_)))
        ));
    }
    assert!(matches!(
        fixture.aggregator.file_review(submission(1, 6, 2, 4)),
        Err(ReviewError::Invalid(ReviewViolation::NotAParty { .. }))
    ));
    assert!(matches!(
        fixture.aggregator.file_review(submission(1, 1, 6, 4)),
        Err(ReviewError::Invalid(ReviewViolation::WrongReviewedUser { .. }))
    ));
    assert!(matches!(
        fixture.aggregator.file_review(submission(404, 1, 2, 4)),
        Err(ReviewError::BookingNotFound(BookingId(404)))
    ));
    assert!(fixture.reviews.is_empty());
}

#[test]
fn concurrent_filings_settle_on_the_full_mean() {
    let fixture = fixture();
    let aggregator = &fixture.aggregator;

    std::thread::scope(|scope| {
        for (booking, reviewer, rating) in [(1, 1, 5), (2, 4, 3), (3, 5, 4)] {
            scope.spawn(move || {
                aggregator
                    .file_review(submission(booking, reviewer, 2, rating))
                    .expect("review filed");
            });
        }
    });

    assert_eq!(stored_rating(&fixture.users, 2), (dec!(4), 3));
}

#[test]
fn recompute_is_idempotent_and_lists_are_newest_first() {
    let fixture = fixture();
    fixture
        .aggregator
        .file_review(submission(1, 1, 2, 5))
        .expect("review");
    fixture
        .aggregator
        .file_review(submission(2, 4, 2, 2))
        .expect("review");

    let once = fixture.aggregator.recompute(UserId(2)).expect("recompute");
    let twice = fixture.aggregator.recompute(UserId(2)).expect("recompute");
    assert_eq!(once, twice);
    assert_eq!(once.rating, dec!(3.5));

    let received = fixture.aggregator.reviews_for_user(UserId(2)).expect("list");
    assert_eq!(received.len(), 2);
    assert!(received[0].created_at >= received[1].created_at);
    assert_eq!(
        fixture
            .aggregator
            .reviews_for_booking(BookingId(1))
            .expect("list")
            .len(),
        1
    );
}

/// User store whose writes fail while `down` is set; reads always succeed.
struct FlakyUsers {
    inner: MemoryRepository<User>,
    down: AtomicBool,
}

impl FlakyUsers {
    fn check(&self) -> Result<(), RepositoryError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("users down".to_string()));
        }
        Ok(())
    }
}

impl Repository<User> for FlakyUsers {
    fn insert(&self, record: User) -> Result<User, RepositoryError> {
        self.check()?;
        self.inner.insert(record)
    }

    fn update(&self, record: User) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.update(record)
    }

    fn update_batch(&self, records: Vec<User>) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.update_batch(records)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn query(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        self.inner.query(filter)
    }

    fn remove(&self, id: &UserId) -> Result<User, RepositoryError> {
        self.check()?;
        self.inner.remove(id)
    }
}

#[test]
fn failed_recompute_withdraws_the_review_so_a_retry_succeeds() {
    let users = MemoryRepository::seeded([
        User::new(UserId(1), "Ali", "ali@example.com"),
        User::new(UserId(2), "Zeynep", "zeynep@example.com"),
    ]);
    let flaky = Arc::new(FlakyUsers {
        inner: users.clone(),
        down: AtomicBool::new(true),
    });
    let reviews = MemoryRepository::new();
    let aggregator = RatingAggregator::new(
        Arc::new(reviews.clone()),
        Arc::new(MemoryRepository::seeded([booking(
            1,
            1,
            2,
            BookingStatus::Completed,
        )])),
        Arc::clone(&flaky),
    );

    match aggregator.file_review(submission(1, 1, 2, 4)) {
        Err(ReviewError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected user store failure, got {other:?}"),
    }
    assert!(reviews.is_empty());
    assert_eq!(stored_rating(&users, 2), (Decimal::ZERO, 0));

    flaky.down.store(false, Ordering::SeqCst);
    let filed = aggregator
        .file_review(submission(1, 1, 2, 4))
        .expect("retry files the review");
    assert_eq!(filed.reviewed_user.review_count, 1);
    assert_eq!(reviews.len(), 1);
    assert_eq!(stored_rating(&users, 2), (dec!(4), 1));
}

#[tokio::test]
async fn create_route_returns_review_and_reputation() {
    let fixture = fixture();
    let router = review_router(Arc::new(fixture.aggregator));

    let response = router
        .oneshot(
            Request::post("/api/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "booking_id": 1,
                        "reviewer_id": 1,
                        "reviewed_user_id": 2,
                        "rating": 4,
                        "comment": "Great host"
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(body["review"]["rating"], 4);
    assert_eq!(body["reviewed_user"]["id"], 2);
    assert_eq!(body["reviewed_user"]["review_count"], 1);
}

#[tokio::test]
async fn create_route_rejects_review_of_open_booking() {
    let fixture = fixture();
    let router = review_router(Arc::new(fixture.aggregator));

    let response = router
        .oneshot(
            Request::post("/api/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&submission(9, 1, 2, 5)).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_route_rejects_out_of_range_rating_payload_as_bad_request() {
    let fixture = fixture();
    let router = review_router(Arc::new(fixture.aggregator));

    let response = router
        .oneshot(
            Request::post("/api/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "booking_id": 1,
                        "reviewer_id": 1,
                        "reviewed_user_id": 2,
                        "rating": 300
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert!(body["error"].is_string());
    assert!(fixture.reviews.is_empty());
}
