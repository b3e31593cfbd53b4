use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volta_api::{app, state::AppState};
use volta_core::notify::LogSmsNotifier;
use volta_core::repository::{OrderRepository, SettingRepository, ShopRepository};
use volta_order::{OrderManager, PollerConfig, ShopLedger, StatusPoller};
use volta_store::app_config::SupplierEndpointConfig;
use volta_store::{
    DbClient, StoreOrderRepository, StoreSettingRepository, StoreShopRepository,
};
use volta_supplier::{SupplierEndpoint, SupplierRegistry, SupplierRouter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volta_api=debug,volta_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = volta_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Volta API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let orders: Arc<dyn OrderRepository> = Arc::new(StoreOrderRepository::new(db.pool.clone()));
    let shops: Arc<dyn ShopRepository> = Arc::new(StoreShopRepository::new(db.pool.clone()));
    let settings: Arc<dyn SettingRepository> =
        Arc::new(StoreSettingRepository::new(db.pool.clone()));

    let registry = Arc::new(SupplierRegistry::from_endpoints(
        endpoint(config.suppliers.dataxpress.clone()),
        endpoint(config.suppliers.hubnet.clone()),
        endpoint(config.suppliers.datakazina.clone()),
        endpoint(config.suppliers.codecraft.clone()),
    ));
    let supplier_router = Arc::new(SupplierRouter::new(
        registry.clone(),
        settings,
        Duration::from_secs(config.router.settings_cache_seconds),
    ));

    let manager = Arc::new(OrderManager::new(
        orders.clone(),
        supplier_router.clone(),
        ShopLedger::new(shops),
        Arc::new(LogSmsNotifier),
    ));
    let poller = Arc::new(StatusPoller::new(
        orders.clone(),
        supplier_router.clone(),
        PollerConfig {
            interval: Duration::from_secs(config.poller.interval_seconds),
            batch_limit: config.poller.batch_limit,
        },
    ));

    // The poller is the only background task; it gets a shutdown signal so
    // an in-flight tick can finish before the process exits.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller_task = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.run(shutdown_rx).await })
    };

    let app_state = AppState {
        manager,
        poller,
        supplier_router,
        registry,
        orders,
    };
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    let _ = shutdown_tx.send(true);
    let _ = poller_task.await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

fn endpoint(config: Option<SupplierEndpointConfig>) -> Option<SupplierEndpoint> {
    config.map(|c| SupplierEndpoint {
        base_url: c.base_url,
        api_key: c.api_key,
        agent_id: c.agent_id,
    })
}
