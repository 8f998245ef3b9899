//! Booking lifecycle and review aggregation services

pub mod service;
pub mod reviews;
pub mod repository;
pub mod config;

pub use service::{BookingService, NewBooking};
pub use reviews::ReviewService;
pub use repository::{BookingRepository, InMemoryBookingRepository, PostgresBookingRepository};
pub use config::BookingServiceConfig;
