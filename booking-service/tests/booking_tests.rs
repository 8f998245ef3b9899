use std::sync::Arc;

use booking_service::{BookingService, InMemoryBookingRepository, NewBooking};
use chrono::{NaiveDate, NaiveTime};
use common::directory::InMemoryDirectory;
use common::error::Error;
use common::model::booking::{BookingStatus, PaymentMethod};
use common::model::directory::ServiceOffering;
use common::notify::InMemoryDispatcher;
use credit_ledger::CreditLedger;
use rust_decimal_macros::dec;
use uuid::Uuid;

struct Fixture {
    service: Arc<BookingService>,
    ledger: Arc<CreditLedger>,
    dispatcher: Arc<InMemoryDispatcher>,
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
        title: "Deep cleaning".to_string(),
        price: dec!(120.00),
        credits_required: 12,
        duration_minutes: 90,
    });

    let ledger = Arc::new(CreditLedger::new());
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let service = Arc::new(BookingService::new(
        Arc::new(InMemoryBookingRepository::new()),
        ledger.clone(),
        directory,
        dispatcher.clone(),
    ));

    Fixture {
        service,
        ledger,
        dispatcher,
        customer_id,
        provider_id,
        service_id,
    }
}

fn new_booking(service_id: Uuid, payment_method: PaymentMethod) -> NewBooking {
    NewBooking {
        service_id,
        scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        scheduled_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        payment_method,
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_new_booking_starts_pending() {
    let fx = fixture();

    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(!booking.is_paid);
    assert_eq!(booking.total_amount, dec!(120.00));
    assert_eq!(booking.provider_id, fx.provider_id);

    // Provider was notified of the request
    assert_eq!(fx.dispatcher.notifications_for(fx.provider_id).len(), 1);
}

#[tokio::test]
async fn test_create_booking_unknown_service_fails() {
    let fx = fixture();

    let result = fx
        .service
        .create_booking(fx.customer_id, new_booking(Uuid::new_v4(), PaymentMethod::Card))
        .await;

    assert!(matches!(result, Err(Error::ServiceNotFound(_))));
}

#[tokio::test]
async fn test_accept_requires_provider() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    // Customer cannot accept their own request
    let result = fx.service.accept(booking.id, fx.customer_id).await;
    assert!(matches!(result, Err(Error::NotAuthorized(_))));

    let accepted = fx.service.accept(booking.id, fx.provider_id).await.unwrap();
    assert_eq!(accepted.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_accept_twice_is_invalid_transition() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    fx.service.accept(booking.id, fx.provider_id).await.unwrap();

    match fx.service.accept(booking.id, fx.provider_id).await {
        Err(Error::InvalidTransition { current, attempted }) => {
            assert_eq!(current, BookingStatus::Confirmed);
            assert_eq!(attempted, "accept");
        }
        other => panic!("Expected InvalidTransition, got {:?}", other.map(|b| b.status)),
    }
}

#[tokio::test]
async fn test_decline_cancels_pending_booking() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    let declined = fx.service.decline(booking.id, fx.provider_id).await.unwrap();
    assert_eq!(declined.status, BookingStatus::Cancelled);

    // Terminal: no further transitions
    let result = fx.service.accept(booking.id, fx.provider_id).await;
    assert!(matches!(result, Err(Error::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_complete_credits_provider_stats() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    fx.service.accept(booking.id, fx.provider_id).await.unwrap();
    fx.service.start(booking.id, fx.provider_id).await.unwrap();
    let completed = fx.service.complete(booking.id, fx.provider_id).await.unwrap();

    assert_eq!(completed.status, BookingStatus::Completed);

    let profile = fx.service.provider_profile(fx.provider_id).await.unwrap();
    assert_eq!(profile.jobs_completed, 1);
    assert_eq!(profile.total_earnings, dec!(120.00));
}

#[tokio::test]
async fn test_concurrent_completion_applies_earnings_once() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    fx.service.accept(booking.id, fx.provider_id).await.unwrap();

    // Fire several concurrent duplicate completion attempts
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = fx.service.clone();
            let provider = fx.provider_id;
            let id = booking.id;
            tokio::spawn(async move { service.complete(id, provider).await })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    // Exactly one completion may win; the rest see a terminal state
    assert_eq!(succeeded, 1);

    let profile = fx.service.provider_profile(fx.provider_id).await.unwrap();
    assert_eq!(profile.jobs_completed, 1);
    assert_eq!(profile.total_earnings, dec!(120.00));
}

#[tokio::test]
async fn test_cancel_from_any_non_terminal_state() {
    let fx = fixture();

    // Pending -> cancel by customer
    let b1 = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();
    let cancelled = fx.service.cancel(b1.id, fx.customer_id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    // Ongoing -> cancel by provider
    let b2 = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();
    fx.service.accept(b2.id, fx.provider_id).await.unwrap();
    fx.service.start(b2.id, fx.provider_id).await.unwrap();
    let cancelled = fx.service.cancel(b2.id, fx.provider_id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_completed_booking_fails() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    fx.service.accept(booking.id, fx.provider_id).await.unwrap();
    fx.service.complete(booking.id, fx.provider_id).await.unwrap();

    match fx.service.cancel(booking.id, fx.customer_id).await {
        Err(Error::InvalidTransition { current, .. }) => {
            assert_eq!(current, BookingStatus::Completed);
        }
        other => panic!("Expected InvalidTransition, got {:?}", other.map(|b| b.status)),
    }
}

#[tokio::test]
async fn test_cancel_by_stranger_fails() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    let result = fx.service.cancel(booking.id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::NotAuthorized(_))));
}

#[tokio::test]
async fn test_cancel_paid_credits_booking_refunds_ledger() {
    let fx = fixture();

    fx.ledger.purchase(fx.customer_id, 20).await.unwrap();

    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Credits))
        .await
        .unwrap();
    fx.service.accept(booking.id, fx.provider_id).await.unwrap();

    // Simulate a settled credits payment
    fx.ledger.debit(fx.customer_id, 12, booking.id).await.unwrap();
    fx.service.mark_paid(booking.id).await.unwrap();
    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 8);

    fx.service.cancel(booking.id, fx.customer_id).await.unwrap();

    // The refund restores the pre-payment balance
    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 20);

    let history = fx.ledger.history(fx.customer_id).await.unwrap();
    let refund = history.last().unwrap();
    assert_eq!(refund.amount, 12);
    assert_eq!(refund.booking_id, Some(booking.id));
}

#[tokio::test]
async fn test_cancel_unpaid_credits_booking_does_not_refund() {
    let fx = fixture();

    fx.ledger.purchase(fx.customer_id, 20).await.unwrap();

    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Credits))
        .await
        .unwrap();

    fx.service.cancel(booking.id, fx.customer_id).await.unwrap();

    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 20);
    assert_eq!(fx.ledger.history(fx.customer_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reschedule_mutates_schedule_only() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    let new_date = NaiveDate::from_ymd_opt(2026, 9, 20).unwrap();
    let new_time = NaiveTime::from_hms_opt(15, 0, 0).unwrap();

    let rescheduled = fx
        .service
        .reschedule(booking.id, new_date, new_time, fx.customer_id)
        .await
        .unwrap();

    assert_eq!(rescheduled.scheduled_date, new_date);
    assert_eq!(rescheduled.scheduled_time, new_time);
    assert_eq!(rescheduled.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_reschedule_after_start_fails() {
    let fx = fixture();
    let booking = fx
        .service
        .create_booking(fx.customer_id, new_booking(fx.service_id, PaymentMethod::Card))
        .await
        .unwrap();

    fx.service.accept(booking.id, fx.provider_id).await.unwrap();
    fx.service.start(booking.id, fx.provider_id).await.unwrap();

    let result = fx
        .service
        .reschedule(
            booking.id,
            NaiveDate::from_ymd_opt(2026, 9, 20).unwrap(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            fx.customer_id,
        )
        .await;

    assert!(matches!(result, Err(Error::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_unknown_booking_fails_with_not_found() {
    let fx = fixture();

    let result = fx.service.accept(Uuid::new_v4(), fx.provider_id).await;
    assert!(matches!(result, Err(Error::BookingNotFound(_))));
}
