use backend::api::{self, AppState};
use backend::rooms::RoomRegistry;

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    dotenv::dotenv().ok();

    let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let room_ttl = Duration::from_secs(env_u64("ROOM_TTL_SECS", 3600));
    let sweep_interval = Duration::from_secs(env_u64("SWEEP_INTERVAL_SECS", 60));

    let rooms = RoomRegistry::new();

    // Periodic reclaim of abandoned rooms.
    let sweeper = rooms.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let removed = sweeper.sweep_expired(room_ttl);
            if !removed.is_empty() {
                tracing::info!(count = removed.len(), "swept expired rooms");
            }
        }
    });

    let app = api::router(AppState::new(rooms));
    tracing::info!(%bind_addr, "checkers room server listening");
    let listener = TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
