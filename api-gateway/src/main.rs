//! API Gateway for the marketplace backend

use std::sync::Arc;

use axum::Router;
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse};
use tracing::{info, Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber, fmt::format::FmtSpan};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_gateway::config::AppConfig;
use api_gateway::docs::ApiDoc;
use api_gateway::{api_router, AppState};
use booking_service::{BookingService, InMemoryBookingRepository, ReviewService};
use common::directory::InMemoryDirectory;
use common::notify::InMemoryDispatcher;
use credit_ledger::CreditLedger;
use payment_service::{InMemoryPaymentRepository, MockGateway, PaymentOrchestrator};

/// Marketplace API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("Debug logging enabled");

    // Initialize services
    let config = AppConfig::new();

    let directory = Arc::new(InMemoryDirectory::new());
    let notifications = Arc::new(InMemoryDispatcher::new());
    let credit_ledger = Arc::new(CreditLedger::new());

    // Reviews live in the same repository as bookings
    let booking_repo = Arc::new(InMemoryBookingRepository::new());

    let booking_service = Arc::new(BookingService::new(
        booking_repo.clone(),
        credit_ledger.clone(),
        directory.clone(),
        notifications.clone(),
    ));

    let review_service = Arc::new(ReviewService::new(
        booking_repo,
        notifications.clone(),
    ));

    let payment_orchestrator = Arc::new(PaymentOrchestrator::new(
        Arc::new(InMemoryPaymentRepository::new()),
        booking_service.clone(),
        credit_ledger.clone(),
        directory,
        Arc::new(MockGateway::new()),
        notifications.clone(),
        config.currency.clone(),
    ));

    // Create app state
    let state = Arc::new(AppState {
        booking_service,
        review_service,
        payment_orchestrator,
        credit_ledger,
        notifications,
        webhook_secret: config.webhook_secret.clone(),
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    // Combine all routes
    let app = Router::new()
        .nest("/api/v1", api_router())
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(log_level)
                )
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level))
        )
        .with_state(state);

    // Start the server
    let addr: std::net::SocketAddr = args.addr.parse().expect("Invalid address");
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

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
