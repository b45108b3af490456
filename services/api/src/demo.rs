use crate::infra::{parse_date, Marketplace};
use chrono::{Duration, NaiveDate};
use clap::Args;
use evpeti::bookings::{BookingOutcome, BookingRequest, BookingStatus, Dispatch, PetDescriptor};
use evpeti::error::AppError;
use evpeti::listings::{Listing, ListingCatalog, ListingDraft, ListingImporter};
use evpeti::reviews::NewReview;
use evpeti::storage::MemoryRepository;
use evpeti::users::{NewUser, UserId};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// First night of the stay (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date, default_value = "2025-01-01")]
    pub(crate) start: NaiveDate,
    /// Number of nights booked.
    #[arg(long, default_value_t = 4)]
    pub(crate) nights: u32,
    /// Nightly price of the demo listing.
    #[arg(long, default_value = "50")]
    pub(crate) nightly_price: Decimal,
    /// Stars the requester gives the sitter at the end.
    #[arg(long, default_value_t = 5)]
    pub(crate) rating: u8,
    /// Refuse cancellation of accepted bookings.
    #[arg(long)]
    pub(crate) strict_cancellation: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV export with header owner_id,title,type,location,price,start_date,end_date
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

pub(crate) fn run_listing_import(args: ImportArgs) -> Result<(), AppError> {
    let catalog = ListingCatalog::new(Arc::new(MemoryRepository::<Listing>::new()));
    let report = ListingImporter::from_path(&args.csv, &catalog)?;

    println!("Listing import: {}", args.csv.display());
    println!("  Imported: {}", report.imported.len());
    for listing in &report.imported {
        println!(
            "    #{} {} ({}, {}) {} per night",
            listing.id,
            listing.display_title(),
            listing.kind,
            listing.location,
            listing.price
        );
    }
    println!("  Rejected: {}", report.rejected.len());
    for row in &report.rejected {
        println!("    line {}: {}", row.line, row.reason);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let policy = evpeti::bookings::TransitionPolicy {
        allow_accepted_cancellation: !args.strict_cancellation,
    };
    let marketplace = Marketplace::in_memory(policy);

    println!("EvPeti booking lifecycle demo");

    let requester = marketplace.users.register(NewUser {
        name: "Ali".to_string(),
        email: "ali@example.com".to_string(),
    })?;
    let sitter = marketplace.users.register(NewUser {
        name: "Zeynep".to_string(),
        email: "zeynep@example.com".to_string(),
    })?;
    println!(
        "  Users: requester #{} {}, sitter #{} {}",
        requester.id, requester.name, sitter.id, sitter.name
    );

    let listing = marketplace.listings.create(ListingDraft {
        owner_id: sitter.id,
        title: Some("Sunny flat with a garden".to_string()),
        kind: "Boarding".to_string(),
        location: "Kadikoy".to_string(),
        price: args.nightly_price,
        start_date: args.start,
        end_date: args.start + Duration::days(90),
        description: None,
        is_available: true,
        is_active: true,
    })?;
    println!(
        "  Listing #{} '{}' at {} per night",
        listing.id,
        listing.display_title(),
        listing.price
    );

    let created = marketplace.bookings.create_booking(BookingRequest {
        requester_id: requester.id,
        listing_id: listing.id,
        start_date: args.start,
        end_date: args.start + Duration::days(i64::from(args.nights)),
        pet: PetDescriptor {
            name: "Karabas".to_string(),
            kind: Some("Dog".to_string()),
            age: Some(4),
            pet_id: None,
        },
        total_price: None,
        notes: Some("Two walks a day".to_string()),
        contact_phone: None,
        contact_email: Some(requester.email.clone()),
    })?;
    render_step("Requested", &created);

    let booking_id = created.booking.id;
    for status in [BookingStatus::Accepted, BookingStatus::Completed] {
        let outcome = marketplace.bookings.update_status(booking_id, status)?;
        render_step(status.label(), &outcome);
    }

    let filed = marketplace.reviews.file_review(NewReview {
        booking_id,
        reviewer_id: requester.id,
        reviewed_user_id: sitter.id,
        rating: args.rating,
        comment: Some("Karabas came home happy".to_string()),
    })?;
    println!(
        "  Review #{}: {} stars; sitter rating now {} over {} review(s)",
        filed.review.id,
        filed.review.rating,
        filed.reviewed_user.rating,
        filed.reviewed_user.review_count
    );

    for user_id in [sitter.id, requester.id] {
        render_inbox(&marketplace, user_id)?;
    }
    Ok(())
}

fn render_step(label: &str, outcome: &BookingOutcome) {
    let booking = &outcome.booking;
    println!(
        "  {label}: booking #{} is {} ({} to {}, total {})",
        booking.id,
        booking.status(),
        booking.start_date,
        booking.end_date,
        booking.total_price
    );
    match &outcome.notification {
        Dispatch::Delivered(id) => println!("    notification #{id} delivered"),
        Dispatch::Skipped => println!("    no notification for this step"),
        Dispatch::Failed(reason) => println!("    notification failed: {reason}"),
    }
}

fn render_inbox(marketplace: &Marketplace, user_id: UserId) -> Result<(), AppError> {
    let notifications = marketplace.notifications.list_for_user(user_id)?;
    let unread = notifications
        .iter()
        .filter(|notification| !notification.is_read())
        .count();
    println!("  Inbox for user #{user_id} ({unread} unread)");
    for notification in notifications {
        println!("    [{}] {}", notification.kind.label(), notification.title);
    }
    Ok(())
}
