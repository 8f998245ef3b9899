use std::sync::Arc;

use booking_service::{BookingService, InMemoryBookingRepository, NewBooking, ReviewService};
use chrono::{NaiveDate, NaiveTime};
use common::directory::InMemoryDirectory;
use common::error::Error;
use common::model::booking::PaymentMethod;
use common::model::directory::ServiceOffering;
use common::notify::InMemoryDispatcher;
use credit_ledger::CreditLedger;
use rust_decimal_macros::dec;
use uuid::Uuid;

struct Fixture {
    bookings: Arc<BookingService>,
    reviews: Arc<ReviewService>,
    customer_id: Uuid,
    provider_id: Uuid,
    service_id: Uuid,
}

fn fixture() -> Fixture {
    let customer_id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_service(ServiceOffering {
        id: service_id,
        provider_id,
        title: "Garden makeover".to_string(),
        price: dec!(300.00),
        credits_required: 30,
        duration_minutes: 240,
    });

    let repo = Arc::new(InMemoryBookingRepository::new());
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let bookings = Arc::new(BookingService::new(
        repo.clone(),
        Arc::new(CreditLedger::new()),
        directory,
        dispatcher.clone(),
    ));
    let reviews = Arc::new(ReviewService::new(repo, dispatcher));

    Fixture {
        bookings,
        reviews,
        customer_id,
        provider_id,
        service_id,
    }
}

async fn completed_booking(fx: &Fixture) -> Uuid {
    let booking = fx
        .bookings
        .create_booking(
            fx.customer_id,
            NewBooking {
                service_id: fx.service_id,
                scheduled_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                payment_method: PaymentMethod::Card,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    fx.bookings.accept(booking.id, fx.provider_id).await.unwrap();
    fx.bookings.complete(booking.id, fx.provider_id).await.unwrap();
    booking.id
}

#[tokio::test]
async fn test_review_requires_completed_booking() {
    let fx = fixture();

    let booking = fx
        .bookings
        .create_booking(
            fx.customer_id,
            NewBooking {
                service_id: fx.service_id,
                scheduled_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                payment_method: PaymentMethod::Card,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    let result = fx
        .reviews
        .submit_review(fx.customer_id, booking.id, 5, "Great".to_string())
        .await;

    assert!(matches!(result, Err(Error::BookingNotCompleted(_))));
}

#[tokio::test]
async fn test_review_requires_the_customer() {
    let fx = fixture();
    let booking_id = completed_booking(&fx).await;

    let result = fx
        .reviews
        .submit_review(fx.provider_id, booking_id, 5, "Great".to_string())
        .await;

    assert!(matches!(result, Err(Error::NotAuthorized(_))));
}

#[tokio::test]
async fn test_duplicate_review_fails() {
    let fx = fixture();
    let booking_id = completed_booking(&fx).await;

    fx.reviews
        .submit_review(fx.customer_id, booking_id, 4, "Solid work".to_string())
        .await
        .unwrap();

    let result = fx
        .reviews
        .submit_review(fx.customer_id, booking_id, 5, "Again".to_string())
        .await;

    assert!(matches!(result, Err(Error::DuplicateReview(_))));
}

#[tokio::test]
async fn test_rating_out_of_range_fails() {
    let fx = fixture();
    let booking_id = completed_booking(&fx).await;

    let result = fx
        .reviews
        .submit_review(fx.customer_id, booking_id, 6, "Too good".to_string())
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let result = fx
        .reviews
        .submit_review(fx.customer_id, booking_id, 0, "Too bad".to_string())
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_provider_rating_is_rounded_mean() {
    let fx = fixture();

    // Three completed bookings with ratings 5, 4, 4 -> mean 4.333... -> 4.33
    for rating in [5u8, 4, 4] {
        let booking_id = completed_booking(&fx).await;
        fx.reviews
            .submit_review(fx.customer_id, booking_id, rating, String::new())
            .await
            .unwrap();
    }

    let profile = fx.bookings.provider_profile(fx.provider_id).await.unwrap();
    assert_eq!(profile.rating, dec!(4.33));
}

#[tokio::test]
async fn test_single_review_sets_exact_rating() {
    let fx = fixture();
    let booking_id = completed_booking(&fx).await;

    fx.reviews
        .submit_review(fx.customer_id, booking_id, 3, String::new())
        .await
        .unwrap();

    let profile = fx.bookings.provider_profile(fx.provider_id).await.unwrap();
    assert_eq!(profile.rating, dec!(3.00));
}

#[tokio::test]
async fn test_concurrent_reviews_all_counted() {
    let fx = fixture();

    // Five completed bookings reviewed concurrently
    let mut booking_ids = Vec::new();
    for _ in 0..5 {
        booking_ids.push(completed_booking(&fx).await);
    }

    let tasks: Vec<_> = booking_ids
        .into_iter()
        .enumerate()
        .map(|(i, booking_id)| {
            let reviews = fx.reviews.clone();
            let customer = fx.customer_id;
            let rating = (i % 5 + 1) as u8;
            tokio::spawn(async move {
                reviews.submit_review(customer, booking_id, rating, String::new()).await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let reviews = fx.reviews.reviews_for_provider(fx.provider_id).await.unwrap();
    assert_eq!(reviews.len(), 5);

    // Ratings 1..=5 -> mean 3.00
    let profile = fx.bookings.provider_profile(fx.provider_id).await.unwrap();
    assert_eq!(profile.rating, dec!(3.00));
}

#[tokio::test]
async fn test_provider_response() {
    let fx = fixture();
    let booking_id = completed_booking(&fx).await;

    let review = fx
        .reviews
        .submit_review(fx.customer_id, booking_id, 5, "Spotless".to_string())
        .await
        .unwrap();

    // Only the provider may respond
    let result = fx
        .reviews
        .respond_to_review(fx.customer_id, review.id, "Thanks!".to_string())
        .await;
    assert!(matches!(result, Err(Error::NotAuthorized(_))));

    let updated = fx
        .reviews
        .respond_to_review(fx.provider_id, review.id, "Thanks!".to_string())
        .await
        .unwrap();
    assert_eq!(updated.provider_response.as_deref(), Some("Thanks!"));
}
