use std::sync::Arc;

use booking_service::{BookingService, InMemoryBookingRepository, NewBooking};
use chrono::{NaiveDate, NaiveTime};
use common::directory::InMemoryDirectory;
use common::error::Error;
use common::model::booking::{Booking, BookingStatus, PaymentMethod};
use common::model::directory::ServiceOffering;
use common::model::payment::{PaymentStatus, PaymentType};
use common::notify::InMemoryDispatcher;
use credit_ledger::CreditLedger;
use payment_service::{
    GatewayEvent, GatewayEventType, InMemoryPaymentRepository, MockGateway, PaymentOrchestrator,
    PaymentRequest,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

struct Fixture {
    bookings: Arc<BookingService>,
    payments: Arc<PaymentOrchestrator>,
    ledger: Arc<CreditLedger>,
    gateway: Arc<MockGateway>,
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
        title: "Fence repair".to_string(),
        price: dec!(100.00),
        credits_required: 10,
        duration_minutes: 120,
    });

    let ledger = Arc::new(CreditLedger::new());
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let bookings = Arc::new(BookingService::new(
        Arc::new(InMemoryBookingRepository::new()),
        ledger.clone(),
        directory.clone(),
        dispatcher.clone(),
    ));

    let gateway = Arc::new(MockGateway::new());
    let payments = Arc::new(PaymentOrchestrator::new(
        Arc::new(InMemoryPaymentRepository::new()),
        bookings.clone(),
        ledger.clone(),
        directory,
        gateway.clone(),
        dispatcher,
        "usd".to_string(),
    ));

    Fixture {
        bookings,
        payments,
        ledger,
        gateway,
        customer_id,
        provider_id,
        service_id,
    }
}

async fn make_booking(fx: &Fixture, payment_method: PaymentMethod) -> Booking {
    fx.bookings
        .create_booking(
            fx.customer_id,
            NewBooking {
                service_id: fx.service_id,
                scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                payment_method,
                notes: String::new(),
            },
        )
        .await
        .unwrap()
}

fn request(booking_id: Uuid, payment_type: PaymentType, payment_method: PaymentMethod) -> PaymentRequest {
    PaymentRequest {
        booking_id,
        payment_type,
        payment_method,
        installment_count: None,
        gateway_token: None,
    }
}

// Credits path

#[tokio::test]
async fn test_pay_with_credits_settles_booking() {
    let fx = fixture();
    fx.ledger.purchase(fx.customer_id, 25).await.unwrap();
    let booking = make_booking(&fx, PaymentMethod::Credits).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Credits, PaymentMethod::Credits),
        )
        .await
        .unwrap();

    assert_eq!(outcome.payment.status, PaymentStatus::Completed);
    assert_eq!(outcome.payment.amount, dec!(100.00));
    assert!(outcome.payment.transaction_id.is_none());

    // Ledger debited by credits_required, not by the money price
    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 15);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(booking.is_paid);
}

#[tokio::test]
async fn test_insufficient_credits_leaves_everything_unchanged() {
    let fx = fixture();
    fx.ledger.purchase(fx.customer_id, 5).await.unwrap();
    let booking = make_booking(&fx, PaymentMethod::Credits).await;

    let result = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Credits, PaymentMethod::Credits),
        )
        .await;

    assert!(matches!(result, Err(Error::InsufficientCredits(_))));

    // Ledger: only the purchase entry; booking unpaid; no payment rows
    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 5);
    assert_eq!(fx.ledger.history(fx.customer_id).await.unwrap().len(), 1);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(!booking.is_paid);

    assert!(fx.payments.payments_for_booking(booking.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_paying_twice_fails_with_already_paid() {
    let fx = fixture();
    fx.ledger.purchase(fx.customer_id, 25).await.unwrap();
    let booking = make_booking(&fx, PaymentMethod::Credits).await;

    fx.payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Credits, PaymentMethod::Credits),
        )
        .await
        .unwrap();

    let result = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Credits, PaymentMethod::Credits),
        )
        .await;

    assert!(matches!(result, Err(Error::AlreadyPaid(_))));
    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 15);
}

#[tokio::test]
async fn test_payment_requires_the_customer() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let result = fx
        .payments
        .process_payment(
            fx.provider_id,
            request(booking.id, PaymentType::Immediate, PaymentMethod::Card),
        )
        .await;

    assert!(matches!(result, Err(Error::NotAuthorized(_))));
}

// Installment path

#[tokio::test]
async fn test_installment_plan_sums_exactly() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let mut req = request(booking.id, PaymentType::Installment, PaymentMethod::Card);
    req.installment_count = Some(3);

    let outcome = fx.payments.process_payment(fx.customer_id, req).await.unwrap();

    assert_eq!(outcome.payment.status, PaymentStatus::Processing);
    assert_eq!(outcome.installments.len(), 3);

    // 100.00 / 3: two parts of 33.33, last absorbs the remainder
    let amounts: Vec<_> = outcome.installments.iter().map(|i| i.amount).collect();
    assert_eq!(amounts[0], dec!(33.33));
    assert_eq!(amounts[1], dec!(33.33));
    assert_eq!(amounts[2], dec!(33.34));

    let total: common::decimal::Amount = amounts.iter().sum();
    assert_eq!(total, dec!(100.00));

    // Numbers contiguous from 1, due dates 30 days apart
    for (i, installment) in outcome.installments.iter().enumerate() {
        assert_eq!(installment.installment_number, i as u32 + 1);
    }
    let gap = outcome.installments[1].due_date - outcome.installments[0].due_date;
    assert_eq!(gap.num_days(), 30);

    // Installments alone never settle the booking
    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(!booking.is_paid);
}

#[tokio::test]
async fn test_installment_count_bounds() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    for count in [1u32, 13] {
        let mut req = request(booking.id, PaymentType::Installment, PaymentMethod::Card);
        req.installment_count = Some(count);

        let result = fx.payments.process_payment(fx.customer_id, req).await;
        assert!(matches!(result, Err(Error::ValidationError(_))));
    }
}

#[tokio::test]
async fn test_installment_count_defaults_to_three() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Installment, PaymentMethod::Card),
        )
        .await
        .unwrap();

    assert_eq!(outcome.installments.len(), 3);
}

// Gateway paths

#[tokio::test]
async fn test_immediate_payment_settles_synchronously() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Immediate, PaymentMethod::Card),
        )
        .await
        .unwrap();

    assert_eq!(outcome.payment.status, PaymentStatus::Completed);
    assert!(outcome.payment.transaction_id.is_some());

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(booking.is_paid);
}

#[tokio::test]
async fn test_gateway_failure_persists_nothing() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    fx.gateway.fail_requests(true);

    let result = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Immediate, PaymentMethod::Card),
        )
        .await;

    assert!(matches!(result, Err(Error::GatewayError(_))));

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(!booking.is_paid);
    assert!(fx.payments.payments_for_booking(booking.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_later_payment_stays_pending() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Later, PaymentMethod::Card),
        )
        .await
        .unwrap();

    assert_eq!(outcome.payment.status, PaymentStatus::Pending);
    assert!(outcome.client_secret.is_some());

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(!booking.is_paid);
}

// Webhook reconciliation

#[tokio::test]
async fn test_webhook_success_completes_payment_and_confirms_booking() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Later, PaymentMethod::Card),
        )
        .await
        .unwrap();

    let transaction_id = outcome.payment.transaction_id.clone().unwrap();
    fx.payments
        .handle_webhook(GatewayEvent {
            event_type: GatewayEventType::PaymentSucceeded,
            object_id: transaction_id,
            raw_payload: serde_json::json!({"status": "succeeded"}),
        })
        .await
        .unwrap();

    let payment = fx.payments.get_payment(outcome.payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(booking.is_paid);
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_webhook_replay_is_a_noop() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Later, PaymentMethod::Card),
        )
        .await
        .unwrap();

    let event = GatewayEvent {
        event_type: GatewayEventType::PaymentSucceeded,
        object_id: outcome.payment.transaction_id.clone().unwrap(),
        raw_payload: serde_json::json!({"status": "succeeded"}),
    };

    fx.payments.handle_webhook(event.clone()).await.unwrap();
    // Delivery is at-least-once: the replay must not error or double-apply
    fx.payments.handle_webhook(event).await.unwrap();

    let payment = fx.payments.get_payment(outcome.payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(booking.is_paid);
}

#[tokio::test]
async fn test_webhook_failure_marks_payment_failed() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Later, PaymentMethod::Card),
        )
        .await
        .unwrap();

    fx.payments
        .handle_webhook(GatewayEvent {
            event_type: GatewayEventType::PaymentFailed,
            object_id: outcome.payment.transaction_id.clone().unwrap(),
            raw_payload: serde_json::json!({"status": "failed"}),
        })
        .await
        .unwrap();

    let payment = fx.payments.get_payment(outcome.payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert!(!booking.is_paid);
}

#[tokio::test]
async fn test_webhook_unknown_transaction_is_swallowed() {
    let fx = fixture();

    // A webhook referencing unknown state is not a fatal error
    fx.payments
        .handle_webhook(GatewayEvent {
            event_type: GatewayEventType::PaymentSucceeded,
            object_id: "pi_unknown".to_string(),
            raw_payload: serde_json::Value::Null,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_webhook_refund_event_requires_completed_payment() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Later, PaymentMethod::Card),
        )
        .await
        .unwrap();

    let transaction_id = outcome.payment.transaction_id.clone().unwrap();

    // Refund event against a pending payment is ignored
    fx.payments
        .handle_webhook(GatewayEvent {
            event_type: GatewayEventType::ChargeRefunded,
            object_id: transaction_id.clone(),
            raw_payload: serde_json::Value::Null,
        })
        .await
        .unwrap();
    let payment = fx.payments.get_payment(outcome.payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);

    // Complete, then the refund event applies
    fx.payments
        .handle_webhook(GatewayEvent {
            event_type: GatewayEventType::PaymentSucceeded,
            object_id: transaction_id.clone(),
            raw_payload: serde_json::Value::Null,
        })
        .await
        .unwrap();
    fx.payments
        .handle_webhook(GatewayEvent {
            event_type: GatewayEventType::ChargeRefunded,
            object_id: transaction_id,
            raw_payload: serde_json::Value::Null,
        })
        .await
        .unwrap();

    let payment = fx.payments.get_payment(outcome.payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
}

// Refund requests

#[tokio::test]
async fn test_refund_cascades_into_cancellation() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;
    fx.bookings.accept(booking.id, fx.provider_id).await.unwrap();

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Immediate, PaymentMethod::Card),
        )
        .await
        .unwrap();

    let refunded = fx
        .payments
        .refund_payment(fx.customer_id, outcome.payment.id, None)
        .await
        .unwrap();

    assert_eq!(refunded.status, PaymentStatus::Refunded);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_double_refund_fails() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Immediate, PaymentMethod::Card),
        )
        .await
        .unwrap();

    fx.payments
        .refund_payment(fx.customer_id, outcome.payment.id, None)
        .await
        .unwrap();

    let result = fx
        .payments
        .refund_payment(fx.customer_id, outcome.payment.id, None)
        .await;

    assert!(matches!(result, Err(Error::AlreadyRefunded(_))));
}

#[tokio::test]
async fn test_refund_of_pending_payment_fails() {
    let fx = fixture();
    let booking = make_booking(&fx, PaymentMethod::Card).await;

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Later, PaymentMethod::Card),
        )
        .await
        .unwrap();

    let result = fx
        .payments
        .refund_payment(fx.customer_id, outcome.payment.id, None)
        .await;

    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_refund_of_credits_payment_restores_balance() {
    let fx = fixture();
    fx.ledger.purchase(fx.customer_id, 25).await.unwrap();
    let booking = make_booking(&fx, PaymentMethod::Credits).await;
    fx.bookings.accept(booking.id, fx.provider_id).await.unwrap();

    let outcome = fx
        .payments
        .process_payment(
            fx.customer_id,
            request(booking.id, PaymentType::Credits, PaymentMethod::Credits),
        )
        .await
        .unwrap();

    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 15);

    fx.payments
        .refund_payment(fx.customer_id, outcome.payment.id, None)
        .await
        .unwrap();

    // Cancellation cascade restores the credits
    assert_eq!(fx.ledger.balance(fx.customer_id).await.unwrap(), 25);

    let booking = fx.bookings.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
}
