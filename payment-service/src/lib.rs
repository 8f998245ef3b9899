//! Payment orchestration over credits, installments and the external gateway

pub mod service;
pub mod gateway;
pub mod repository;
pub mod config;

pub use service::{PaymentOrchestrator, PaymentRequest, PaymentOutcome};
pub use gateway::{PaymentGateway, MockGateway, GatewayIntent, GatewayRefund, GatewayEvent, GatewayEventType};
pub use repository::{PaymentRepository, InMemoryPaymentRepository, PostgresPaymentRepository};
pub use config::PaymentServiceConfig;
