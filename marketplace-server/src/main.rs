//! Marketplace server integration module

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH, Instant};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use booking_service::{BookingService, InMemoryBookingRepository, NewBooking, ReviewService};
use chrono::{NaiveDate, NaiveTime};
use clap::Parser;
use common::directory::InMemoryDirectory;
use common::model::booking::PaymentMethod;
use common::model::directory::{ServiceOffering, User};
use common::notify::InMemoryDispatcher;
use credit_ledger::CreditLedger;
use dotenv::dotenv;
use payment_service::{InMemoryPaymentRepository, MockGateway, PaymentOrchestrator};
use rust_decimal_macros::dec;
use tokio::signal;
use tracing::{info, debug, Level};
use tracing_subscriber::{FmtSubscriber, EnvFilter, fmt::format::FmtSpan};
use uuid::Uuid;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Run with demo data
    #[clap(short, long)]
    demo: bool,
}

// Static variable to track service start time
static START_TIME: AtomicU64 = AtomicU64::new(0);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    // Create an environment filter
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,booking_service=debug,payment_service=debug,credit_ledger=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    // Only set the global subscriber if it hasn't been set already
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized");
        if env_debug == "1" {
            debug!("Debug logging enabled");
        }
    }

    info!("Starting Servana Marketplace...");

    // Initialize service start time for uptime tracking
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    START_TIME.store(now, Ordering::Relaxed);

    // Initialize services
    let config = api_gateway::config::AppConfig::new();

    let directory = Arc::new(InMemoryDirectory::new());
    let notifications = Arc::new(InMemoryDispatcher::new());
    let credit_ledger = Arc::new(CreditLedger::new());
    let booking_repo = Arc::new(InMemoryBookingRepository::new());

    let booking_service = Arc::new(BookingService::new(
        booking_repo.clone(),
        credit_ledger.clone(),
        directory.clone(),
        notifications.clone(),
    ));

    let review_service = Arc::new(ReviewService::new(booking_repo, notifications.clone()));

    let payment_orchestrator = Arc::new(PaymentOrchestrator::new(
        Arc::new(InMemoryPaymentRepository::new()),
        booking_service.clone(),
        credit_ledger.clone(),
        directory.clone(),
        Arc::new(MockGateway::new()),
        notifications.clone(),
        config.currency.clone(),
    ));

    // Create demo data if requested
    if args.demo {
        info!("Creating demo data...");
        create_demo_data(
            directory.clone(),
            credit_ledger.clone(),
            booking_service.clone(),
            payment_orchestrator.clone(),
        ).await?;
    }

    // Start API server in a separate task
    let api_handle = {
        let state = Arc::new(api_gateway::AppState {
            booking_service,
            review_service,
            payment_orchestrator,
            credit_ledger,
            notifications,
            webhook_secret: config.webhook_secret.clone(),
        });

        tokio::spawn(async move {
            // Set up CORS
            let cors = tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any);

            // Combine all routes
            let app = axum::Router::new()
                // Health Check
                .route("/health", axum::routing::get(health_check))
                .nest("/api/v1", api_gateway::api_router())
                .layer(cors)
                .layer(tower_http::trace::TraceLayer::new_for_http()
                    .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(log_level))
                    .on_request(tower_http::trace::DefaultOnRequest::new().level(log_level))
                    .on_response(tower_http::trace::DefaultOnResponse::new().level(log_level)))
                .with_state(state);

            // Parse address to listen on
            let port = std::env::var("API_PORT").unwrap_or_else(|_| "8081".to_string());
            let port: u16 = port.parse().expect("Invalid API_PORT value");
            info!("Starting API server on 0.0.0.0:{}", port);
            let addr: std::net::SocketAddr = ([0, 0, 0, 0], port).into();

            // Start the server
            let listener = tokio::net::TcpListener::bind(&addr).await.expect("Failed to bind to address");
            axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.expect("Server error");
        })
    };

    // Wait for the API server to finish
    api_handle.await?;

    info!("Shutting down");
    Ok(())
}

// Health check endpoint
async fn health_check(
    State(state): State<Arc<api_gateway::AppState>>,
) -> impl IntoResponse {
    let start_time = Instant::now();

    // Check if the booking service is responsive
    let bs_start = Instant::now();
    let booking_service_status = match state.booking_service.get_booking(Uuid::nil()).await {
        // Any response means the service is working, even a miss for a nil UUID
        Ok(_) => "up",
        Err(_) => "down",
    };
    let booking_service_latency = bs_start.elapsed().as_millis() as u64;

    // Check if the credit ledger is responsive
    let cl_start = Instant::now();
    let credit_ledger_status = match state.credit_ledger.balance(Uuid::nil()).await {
        Ok(_) => "up",
        Err(_) => "down",
    };
    let credit_ledger_latency = cl_start.elapsed().as_millis() as u64;

    // Check if the payment orchestrator is responsive
    let po_start = Instant::now();
    let payment_service_status = match state.payment_orchestrator.get_payment(Uuid::nil()).await {
        Ok(_) => "up",
        Err(_) => "down",
    };
    let payment_service_latency = po_start.elapsed().as_millis() as u64;

    // Overall status depends on all services
    let overall_status = if booking_service_status == "up"
        && credit_ledger_status == "up"
        && payment_service_status == "up"
    {
        "healthy"
    } else {
        "degraded"
    };

    // Get system metrics
    let memory_usage = get_memory_usage_mb();
    let uptime = get_uptime_seconds();

    // Total response time for this health check
    let total_latency = start_time.elapsed().as_millis() as u64;

    // Build the health information JSON
    let health_info = serde_json::json!({
        "status": overall_status,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "services": {
            "booking_service": {
                "status": booking_service_status,
                "latency_ms": booking_service_latency
            },
            "credit_ledger": {
                "status": credit_ledger_status,
                "latency_ms": credit_ledger_latency
            },
            "payment_service": {
                "status": payment_service_status,
                "latency_ms": payment_service_latency
            }
        },
        "system": {
            "memory_usage_mb": memory_usage,
        },
        "health_check_latency_ms": total_latency
    });

    if overall_status == "healthy" {
        (axum::http::StatusCode::OK, Json(health_info))
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(health_info))
    }
}

// Helper function to get uptime in seconds
fn get_uptime_seconds() -> u64 {
    let current_start = START_TIME.load(Ordering::Relaxed);
    if current_start == 0 {
        // First call, initialize start time
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        START_TIME.store(now, Ordering::Relaxed);
        return 0;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    now.saturating_sub(current_start)
}

// Helper function to get memory usage in MB
fn get_memory_usage_mb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        use std::fs::File;
        use std::io::Read;

        if let Ok(mut file) = File::open("/proc/self/status") {
            let mut contents = String::new();
            if let Ok(_) = file.read_to_string(&mut contents) {
                if let Some(line) = contents.lines().find(|l| l.starts_with("VmRSS:")) {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<u64>() {
                            return kb / 1024; // Convert KB to MB
                        }
                    }
                }
            }
        }
    }

    // Default if we can't get the actual usage or not on Linux
    0
}

/// Create demo data for testing
async fn create_demo_data(
    directory: Arc<InMemoryDirectory>,
    credit_ledger: Arc<CreditLedger>,
    booking_service: Arc<BookingService>,
    payment_orchestrator: Arc<PaymentOrchestrator>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Demo users
    let alice = User {
        id: Uuid::new_v4(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
    };
    let bob = User {
        id: Uuid::new_v4(),
        name: "Bob".to_string(),
        email: "bob@example.com".to_string(),
    };
    directory.insert_user(alice.clone());
    directory.insert_user(bob.clone());

    info!("Created demo users: Alice = {}, Bob = {}", alice.id, bob.id);

    // Bob offers two services
    let cleaning = ServiceOffering {
        id: Uuid::new_v4(),
        provider_id: bob.id,
        title: "Home cleaning".to_string(),
        price: dec!(80.00),
        credits_required: 8,
        duration_minutes: 120,
    };
    let gardening = ServiceOffering {
        id: Uuid::new_v4(),
        provider_id: bob.id,
        title: "Garden maintenance".to_string(),
        price: dec!(120.00),
        credits_required: 12,
        duration_minutes: 180,
    };
    directory.insert_service(cleaning.clone());
    directory.insert_service(gardening.clone());

    // Alice buys credits
    credit_ledger.purchase(alice.id, 50).await?;
    info!("Funded Alice with 50 credits");

    // Alice books the cleaning service and pays with credits
    let booking = booking_service
        .create_booking(
            alice.id,
            NewBooking {
                service_id: cleaning.id,
                scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                payment_method: PaymentMethod::Credits,
                notes: "Two bedrooms and a kitchen".to_string(),
            },
        )
        .await?;

    booking_service.accept(booking.id, bob.id).await?;

    payment_orchestrator
        .process_payment(
            alice.id,
            payment_service::PaymentRequest {
                booking_id: booking.id,
                payment_type: common::model::payment::PaymentType::Credits,
                payment_method: PaymentMethod::Credits,
                installment_count: None,
                gateway_token: None,
            },
        )
        .await?;

    info!("Demo booking {} paid with credits", booking.id);

    // A second booking on an installment plan
    let booking = booking_service
        .create_booking(
            alice.id,
            NewBooking {
                service_id: gardening.id,
                scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                payment_method: PaymentMethod::Card,
                notes: String::new(),
            },
        )
        .await?;

    let outcome = payment_orchestrator
        .process_payment(
            alice.id,
            payment_service::PaymentRequest {
                booking_id: booking.id,
                payment_type: common::model::payment::PaymentType::Installment,
                payment_method: PaymentMethod::Card,
                installment_count: Some(3),
                gateway_token: None,
            },
        )
        .await?;

    info!(
        "Demo booking {} on a {}-installment plan",
        booking.id,
        outcome.installments.len()
    );

    info!("Demo data created successfully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
