use common::error::Error;
use payment_service::gateway::{sign_payload, verify_event};
use payment_service::GatewayEventType;

const SECRET: &str = "whsec_test";

#[test]
fn test_valid_signature_parses_event() {
    let payload = br#"{"type":"payment_succeeded","object_id":"pi_123","raw_payload":{"amount":100}}"#;
    let signature = sign_payload(SECRET, payload);

    let event = verify_event(SECRET, payload, &signature).unwrap();

    assert_eq!(event.event_type, GatewayEventType::PaymentSucceeded);
    assert_eq!(event.object_id, "pi_123");
    assert_eq!(event.raw_payload["amount"], 100);
}

#[test]
fn test_tampered_payload_is_rejected() {
    let payload = br#"{"type":"payment_succeeded","object_id":"pi_123"}"#;
    let signature = sign_payload(SECRET, payload);

    let tampered = br#"{"type":"payment_succeeded","object_id":"pi_999"}"#;
    let result = verify_event(SECRET, tampered, &signature);

    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[test]
fn test_wrong_secret_is_rejected() {
    let payload = br#"{"type":"payment_failed","object_id":"pi_123"}"#;
    let signature = sign_payload("whsec_other", payload);

    let result = verify_event(SECRET, payload, &signature);

    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[test]
fn test_all_event_types_deserialize() {
    for (name, expected) in [
        ("payment_succeeded", GatewayEventType::PaymentSucceeded),
        ("payment_failed", GatewayEventType::PaymentFailed),
        ("payment_canceled", GatewayEventType::PaymentCanceled),
        ("charge_refunded", GatewayEventType::ChargeRefunded),
    ] {
        let payload = format!(r#"{{"type":"{}","object_id":"pi_1"}}"#, name);
        let signature = sign_payload(SECRET, payload.as_bytes());

        let event = verify_event(SECRET, payload.as_bytes(), &signature).unwrap();
        assert_eq!(event.event_type, expected);
    }
}

#[test]
fn test_malformed_payload_fails_as_serialization_error() {
    let payload = br#"{"type":"payment_succeeded""#;
    let signature = sign_payload(SECRET, payload);

    let result = verify_event(SECRET, payload, &signature);
    assert!(matches!(result, Err(Error::Serialization(_))));
}
