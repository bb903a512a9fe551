use sea_orm::Database;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use storefront::payment::{FakeGateway, PaymentGateway, StripeGateway};
use storefront::{create_app, AppState, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "Storefront stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;

    let gateway: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
        Some(key) => Arc::new(StripeGateway::new(key.clone())),
        None => {
            warn!("STRIPE_SECRET_KEY is not set, payments go through the in-process fake gateway");
            Arc::new(FakeGateway::new())
        }
    };

    let state = AppState::init(db, &config, gateway).await?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Storefront listening");
    axum::serve(listener, app).await?;
    Ok(())
}
