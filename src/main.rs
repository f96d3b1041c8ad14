//! `coach-realtime` - notification client binary.
//!
//! Loads configuration from the environment, opens a session with the
//! configured access token and logs notification changes until Ctrl-C.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use coach_realtime::adapters::auth::InMemoryAuthSession;
use coach_realtime::adapters::http::{HttpApiConfig, HttpNotificationApi};
use coach_realtime::adapters::websocket::{WebSocketConfig, WebSocketTransport};
use coach_realtime::application::{
    badge_label, ConnectionManager, ConnectionSettings, EventDispatcher, NotificationStore,
    SessionSupervisor,
};
use coach_realtime::config::AppConfig;
use coach_realtime::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.client)?;
    config.validate()?;

    info!(
        api = %config.api.base_url,
        endpoint = %config.realtime.endpoint_url,
        "Starting coach-realtime"
    );

    let auth = Arc::new(InMemoryAuthSession::new());

    let api = Arc::new(HttpNotificationApi::new(
        HttpApiConfig::new(config.api.base_url.as_str()).with_timeout(config.api.request_timeout()),
        auth.clone(),
    )?);
    let transport = Arc::new(WebSocketTransport::new(
        WebSocketConfig::new(config.realtime.endpoint_url.as_str())
            .with_connect_timeout(config.realtime.connect_timeout()),
    ));

    let store = Arc::new(
        NotificationStore::with_alert_capacity(api, config.realtime.alert_capacity)
            .with_auth_session(auth.clone()),
    );
    let settings = ConnectionSettings {
        heartbeat_interval: config.realtime.heartbeat_interval(),
        pong_timeout: config.realtime.pong_timeout(),
        reconnect: config.realtime.reconnect_policy(),
    };
    let connections = Arc::new(
        ConnectionManager::new(
            transport,
            Arc::new(EventDispatcher::new(store.clone())),
            settings,
        )
        .with_auth_session(auth.clone()),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let supervisor = SessionSupervisor::new(auth.clone(), connections, store.clone());
    let supervisor_task = tokio::spawn(async move { supervisor.run(shutdown_rx).await });
    tokio::spawn(log_changes(store.clone()));

    match config.client.access_token() {
        Some(token) => {
            auth.login(token);
        }
        None => warn!("No access token configured, waiting without a session"),
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    supervisor_task.await?;

    info!("coach-realtime stopped");
    Ok(())
}

/// Logs snapshot changes and new-notification alerts.
async fn log_changes(store: Arc<NotificationStore>) {
    let mut snapshots = store.subscribe();
    let mut alerts = store.alerts();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                info!(
                    total = snapshot.notifications.len(),
                    unread = snapshot.unread_count,
                    badge = %badge_label(snapshot.unread_count).unwrap_or_default(),
                    loading = snapshot.loading,
                    connection = %snapshot.connection_state,
                    "Notifications updated"
                );
            }
            alert = alerts.recv() => match alert {
                Ok(notification) => {
                    info!(notification_id = %notification.id(), message = notification.message(), "New notification");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Alert log lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
