use anyhow::Context;
use bookindoor_api::{app, middleware::JwtTokenVerifier, AppState, Backends, PaymentSettings};
use bookindoor_core::clock::SystemClock;
use bookindoor_core::notify::{BookingNotifier, LogNotifier};
use bookindoor_store::{Config, DbClient, PgAdminRepository, PgBookingRepository, PgVenueRepository, SmtpNotifier};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookindoor_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting BookIndoor API on port {}", config.server.port);

    // refuse to start without gateway credentials or with broken business rules
    let credentials = config.payhere.credentials()?;
    let pricing = config.business_rules.pricing()?;

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let notifier: Arc<dyn BookingNotifier> = if config.email.enabled {
        Arc::new(SmtpNotifier::new(&config.email)?)
    } else {
        tracing::info!("Email delivery disabled; confirmations are logged only");
        Arc::new(LogNotifier)
    };

    let backends = Backends {
        venues: Arc::new(PgVenueRepository::new(db.pool.clone())),
        bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
        admins: Arc::new(PgAdminRepository::new(db.pool.clone())),
        notifier,
        tokens: Arc::new(JwtTokenVerifier::new(&config.auth.jwt_secret)),
        clock: Arc::new(SystemClock),
    };
    let payment = PaymentSettings {
        credentials,
        checkout: config.payhere.checkout(),
    };

    let app = app(AppState::new(backends, payment, pricing));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
