use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evermore::auth::{GoTrueClient, GoTrueMagicLink};
use evermore::config::Config;
use evermore::db::{create_pool, init_db, AppState};
use evermore::email::EmailService;
use evermore::handlers;
use evermore::payments::StripeClient;
use evermore::rate_limit;

#[derive(Parser, Debug)]
#[command(name = "evermore")]
#[command(about = "Backend for the Evermore wedding-website platform")]
struct Cli {
    /// Override the listen host (defaults to HOST env or 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port (defaults to PORT env or 3000)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evermore=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = pool.get().expect("Failed to get database connection");
        init_db(&conn).expect("Failed to initialize database schema");
    }

    let stripe = match (&config.stripe_secret_key, &config.stripe_price_id) {
        (Some(key), Some(price)) => Some(Arc::new(StripeClient::new(
            key.clone(),
            price.clone(),
        ))),
        _ => {
            tracing::warn!(
                "STRIPE_SECRET_KEY / STRIPE_PRICE_ID not set, signup endpoints will answer 503"
            );
            None
        }
    };

    let auth = match (&config.gotrue_url, &config.gotrue_service_key) {
        (Some(url), Some(key)) => Some(Arc::new(GoTrueClient::new(url.clone(), key.clone()))),
        _ => {
            tracing::warn!(
                "GOTRUE_URL / GOTRUE_SERVICE_KEY not set, provisioning will answer 503"
            );
            None
        }
    };

    let email = Arc::new(EmailService::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
    ));
    if config.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set, magic link emails will be skipped");
    }

    let magic_link = auth
        .as_ref()
        .map(|auth| Arc::new(GoTrueMagicLink::new(auth.clone(), email.clone())));

    let state = AppState {
        db: pool,
        base_url: config.base_url.clone(),
        app_url: config.app_url.clone(),
        payment_verifier: stripe.as_ref().map(|s| s.clone() as _),
        checkout_sessions: stripe.as_ref().map(|s| s.clone() as _),
        identity: auth.as_ref().map(|a| a.clone() as _),
        magic_link: magic_link.map(|m| m as _),
    };

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/signup/checkout",
            post(handlers::signup::initiate_checkout)
                .layer(rate_limit::strict_layer(config.rate_limit_strict_rpm)),
        )
        .route(
            "/signup/verify-payment",
            post(handlers::signup::verify_payment)
                .layer(rate_limit::standard_layer(config.rate_limit_standard_rpm)),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr();
    tracing::info!(addr = %addr, "Starting evermore API");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
